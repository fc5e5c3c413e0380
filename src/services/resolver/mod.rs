//! Token -> claims resolution.
//!
//! `IdentityResolver` is the seam to whatever validates tokens (a Cognito user pool, a
//! fixed key, a test double). The authenticator never talks to it directly: it goes
//! through `ResolverAdapter`, which folds every failure into "no identity".

mod adapter;
mod cognito;
mod jwks;
mod multi_pool;
mod static_key;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use crate::config::ConfigError;
use crate::identity::Claims;

pub use adapter::ResolverAdapter;
pub use cognito::{CognitoResolver, pool_issuer};
pub use jwks::JwksCache;
pub use multi_pool::MultiPoolResolver;
pub use static_key::StaticKeyResolver;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Validates `token` and returns its claims.
    async fn resolve(&self, token: &str) -> Result<Claims, ResolveError>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("token expired")]
    Expired,

    #[error("token rejected: {0}")]
    Rejected(jsonwebtoken::errors::Error),

    #[error("unknown signing key: {0:?}")]
    UnknownKey(Option<String>),

    #[error("unknown token issuer: {0:?}")]
    UnknownIssuer(Option<String>),

    #[error("signing keys unavailable: {0}")]
    KeySet(String),
}

impl ResolveError {
    /// Failures of the resolver itself, as opposed to a bad token.
    pub fn is_operational(&self) -> bool {
        matches!(self, ResolveError::KeySet(_))
    }
}

impl From<jsonwebtoken::errors::Error> for ResolveError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        if matches!(e.kind(), ErrorKind::ExpiredSignature) {
            ResolveError::Expired
        } else {
            ResolveError::Rejected(e)
        }
    }
}

/// Parameters the authenticator builds its resolver from.
#[derive(Clone)]
pub enum ResolverParams {
    /// A Cognito user pool; tokens are checked against the pool's published JWKS.
    Pool {
        region: String,
        user_pool_id: String,
    },
    /// Several Cognito user pools as `(region, user_pool_id)`; a token is checked against
    /// the pool named by its `iss`.
    Pools(Vec<(String, String)>),
    /// A ready-made resolver.
    Instance(Arc<dyn IdentityResolver>),
}

impl ResolverParams {
    pub fn pool(region: impl Into<String>, user_pool_id: impl Into<String>) -> Self {
        Self::Pool {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
        }
    }

    pub fn pools<I, R, P>(pools: I) -> Self
    where
        I: IntoIterator<Item = (R, P)>,
        R: Into<String>,
        P: Into<String>,
    {
        Self::Pools(
            pools
                .into_iter()
                .map(|(region, pool)| (region.into(), pool.into()))
                .collect(),
        )
    }

    pub fn instance<R: IdentityResolver + 'static>(resolver: R) -> Self {
        Self::Instance(Arc::new(resolver))
    }

    pub(crate) fn into_resolver(self) -> Result<Arc<dyn IdentityResolver>, ConfigError> {
        match self {
            Self::Pool {
                region,
                user_pool_id,
            } => Ok(Arc::new(CognitoResolver::new(&region, &user_pool_id)?)),
            Self::Pools(pools) => Ok(Arc::new(MultiPoolResolver::cognito(pools)?)),
            Self::Instance(resolver) => Ok(resolver),
        }
    }
}

impl fmt::Debug for ResolverParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool {
                region,
                user_pool_id,
            } => f
                .debug_struct("Pool")
                .field("region", region)
                .field("user_pool_id", user_pool_id)
                .finish(),
            Self::Pools(pools) => f.debug_tuple("Pools").field(pools).finish(),
            Self::Instance(_) => f.write_str("Instance"),
        }
    }
}
