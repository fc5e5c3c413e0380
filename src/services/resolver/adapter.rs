use std::sync::Arc;

use super::IdentityResolver;
use crate::identity::Claims;

/// Wraps an `IdentityResolver` so that every negative outcome is just `None`.
///
/// - No token: `None`, the resolver is not called.
/// - Bad, expired or unknown-key tokens: `None`, logged at debug.
/// - Resolver unavailable (key fetch failed): `None`, logged at warn so an outage can be
///   told apart from anonymous traffic in the logs.
#[derive(Clone)]
pub struct ResolverAdapter {
    inner: Arc<dyn IdentityResolver>,
}

impl ResolverAdapter {
    pub fn new(inner: Arc<dyn IdentityResolver>) -> Self {
        Self { inner }
    }

    pub async fn resolve(&self, token: Option<&str>) -> Option<Claims> {
        let token = token?;

        match self.inner.resolve(token).await {
            Ok(claims) => Some(claims),
            Err(err) if err.is_operational() => {
                tracing::warn!(error = %err, "identity resolver failure, treating request as anonymous");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "token rejected");
                None
            }
        }
    }
}

impl std::fmt::Debug for ResolverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverAdapter").finish_non_exhaustive()
    }
}
