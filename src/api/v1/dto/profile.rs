use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identity::Identity;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub sub: Option<String>,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub groups: Vec<String>,
    pub scopes: Vec<String>,
}

impl From<&Identity> for ProfileResponse {
    fn from(identity: &Identity) -> Self {
        let string_claim =
            |name: &str| identity.claim(name).and_then(|v| v.as_str()).map(str::to_string);

        Self {
            sub: string_claim("sub"),
            // access tokens carry `username`, id tokens `cognito:username`
            username: string_claim("username").or_else(|| string_claim("cognito:username")),
            expires_at: DateTime::from_timestamp(identity.exp(), 0),
            groups: identity.groups().map(<[String]>::to_vec).unwrap_or_default(),
            scopes: identity.scopes().map(<[String]>::to_vec).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    pub sub: Option<String>,
}
