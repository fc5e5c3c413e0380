use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use serde::Deserialize;

use super::{CognitoResolver, IdentityResolver, ResolveError};
use crate::config::ConfigError;
use crate::identity::Claims;

/// Accepts tokens from several issuers (e.g. user pools).
///
/// The unverified `iss` of the token only selects the resolver; that resolver then does the
/// full verification, issuer included.
#[derive(Clone, Default)]
pub struct MultiPoolResolver {
    pools: HashMap<String, Arc<dyn IdentityResolver>>,
}

impl MultiPoolResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes tokens whose `iss` equals `issuer` to `resolver`. A later registration for the
    /// same issuer replaces the earlier one.
    pub fn with_pool<R>(mut self, issuer: impl Into<String>, resolver: R) -> Self
    where
        R: IdentityResolver + 'static,
    {
        self.pools.insert(issuer.into(), Arc::new(resolver));
        self
    }

    /// One `CognitoResolver` per `(region, user_pool_id)`.
    pub fn cognito<I, R, P>(pools: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (R, P)>,
        R: AsRef<str>,
        P: AsRef<str>,
    {
        let mut resolver = Self::new();
        for (region, pool) in pools {
            let pool = CognitoResolver::new(region.as_ref(), pool.as_ref())?;
            resolver = resolver.with_pool(pool.issuer().to_string(), pool);
        }

        if resolver.pools.is_empty() {
            return Err(ConfigError::Missing("user pools"));
        }
        Ok(resolver)
    }

    pub fn issuers(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }
}

impl fmt::Debug for MultiPoolResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiPoolResolver")
            .field("issuers", &self.pools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl IdentityResolver for MultiPoolResolver {
    async fn resolve(&self, token: &str) -> Result<Claims, ResolveError> {
        let Some(issuer) = unverified_issuer(token)? else {
            return Err(ResolveError::UnknownIssuer(None));
        };

        match self.pools.get(&issuer) {
            Some(resolver) => resolver.resolve(token).await,
            None => Err(ResolveError::UnknownIssuer(Some(issuer))),
        }
    }
}

#[derive(Deserialize)]
struct IssuerOnly {
    #[serde(default)]
    iss: Option<String>,
}

fn unverified_issuer(token: &str) -> Result<Option<String>, ResolveError> {
    let malformed = || ResolveError::Rejected(ErrorKind::InvalidToken.into());

    let payload = token.split('.').nth(1).ok_or_else(malformed)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| malformed())?;
    let claims: IssuerOnly = serde_json::from_slice(&bytes).map_err(|_| malformed())?;

    Ok(claims.iss)
}
