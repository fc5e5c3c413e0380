//! Cached JSON Web Key Set of a token issuer.

use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::RwLock;
use url::Url;

use super::ResolveError;

/// Minimum time between two fetch attempts, failed ones included. An unknown `kid` inside
/// this window is just unknown.
const REFETCH_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Default)]
struct Cached {
    keys: Option<JwkSet>,
    attempted_at: Option<Instant>,
    /// Reason of the last failed fetch, cleared by a successful one.
    last_error: Option<String>,
}

/// Signing keys fetched lazily from `url` and refetched when a token names a `kid` the
/// cache does not know (key rotation).
pub struct JwksCache {
    url: Url,
    http: reqwest::Client,
    state: RwLock<Cached>,
}

impl JwksCache {
    pub fn new(url: Url, http: reqwest::Client) -> Self {
        Self {
            url,
            http,
            state: RwLock::new(Cached::default()),
        }
    }

    /// Starts from a known key set, counted as freshly fetched.
    pub fn with_keys(url: Url, http: reqwest::Client, keys: JwkSet) -> Self {
        Self {
            url,
            http,
            state: RwLock::new(Cached {
                keys: Some(keys),
                attempted_at: Some(Instant::now()),
                last_error: None,
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn key(&self, kid: &str) -> Result<DecodingKey, ResolveError> {
        if let Some(key) = self.cached(kid).await? {
            return Ok(key);
        }

        self.refresh_if_stale().await?;

        self.cached(kid)
            .await?
            .ok_or_else(|| ResolveError::UnknownKey(Some(kid.to_string())))
    }

    async fn cached(&self, kid: &str) -> Result<Option<DecodingKey>, ResolveError> {
        let state = self.state.read().await;

        match state.keys.as_ref().and_then(|set| set.find(kid)) {
            Some(jwk) => Ok(Some(DecodingKey::from_jwk(jwk)?)),
            None => Ok(None),
        }
    }

    async fn refresh_if_stale(&self) -> Result<(), ResolveError> {
        {
            let mut state = self.state.write().await;

            // Another request may have tried while we waited for the lock
            if state
                .attempted_at
                .is_some_and(|at| at.elapsed() < REFETCH_COOLDOWN)
            {
                return match (&state.keys, &state.last_error) {
                    (None, Some(reason)) => Err(ResolveError::KeySet(reason.clone())),
                    _ => Ok(()),
                };
            }

            state.attempted_at = Some(Instant::now());
        }

        // Fetch without holding the lock so cached keys stay readable meanwhile
        let fetched = self.fetch().await;
        let mut state = self.state.write().await;

        match fetched {
            Ok(keys) => {
                tracing::info!(url = %self.url, keys = keys.keys.len(), "fetched signing keys");
                state.keys = Some(keys);
                state.last_error = None;
                Ok(())
            }
            Err(reason) => {
                tracing::debug!(url = %self.url, error = %reason, "signing key fetch failed");
                state.last_error = Some(reason.clone());
                Err(ResolveError::KeySet(reason))
            }
        }
    }

    async fn fetch(&self) -> Result<JwkSet, String> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        response.json::<JwkSet>().await.map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}
