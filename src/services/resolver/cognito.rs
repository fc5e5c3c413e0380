use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation};
use url::Url;

use super::{IdentityResolver, JwksCache, ResolveError};
use crate::config::ConfigError;
use crate::identity::Claims;

/// Resolver for tokens issued by an AWS Cognito user pool.
///
/// Checks the RS256 signature against the pool's JWKS, `iss` against the pool URL, and
/// `exp`. Works for both id and access tokens.
#[derive(Debug)]
pub struct CognitoResolver {
    issuer: String,
    validation: Validation,
    jwks: JwksCache,
}

/// `iss` of tokens issued by the given pool.
pub fn pool_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

impl CognitoResolver {
    pub fn new(region: &str, user_pool_id: &str) -> Result<Self, ConfigError> {
        let region = region.trim();
        let user_pool_id = user_pool_id.trim();
        if region.is_empty() {
            return Err(ConfigError::Missing("region"));
        }
        if user_pool_id.is_empty() {
            return Err(ConfigError::Missing("user_pool_id"));
        }

        let issuer = pool_issuer(region, user_pool_id);
        let jwks_url = Url::parse(&format!("{issuer}/.well-known/jwks.json"))
            .map_err(|_| ConfigError::Invalid("user_pool_id"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|_| ConfigError::Invalid("jwks http client"))?;

        Ok(Self::with_jwks(&issuer, JwksCache::new(jwks_url, http)))
    }

    pub fn with_jwks(issuer: &str, jwks: JwksCache) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.validate_aud = false;

        Self {
            issuer: issuer.to_string(),
            validation,
            jwks,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn jwks_url(&self) -> &Url {
        self.jwks.url()
    }
}

#[async_trait]
impl IdentityResolver for CognitoResolver {
    async fn resolve(&self, token: &str) -> Result<Claims, ResolveError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or(ResolveError::UnknownKey(None))?;
        let key = self.jwks.key(&kid).await?;

        let data = jsonwebtoken::decode::<Claims>(token, &key, &self.validation)?;
        Ok(data.claims)
    }
}
