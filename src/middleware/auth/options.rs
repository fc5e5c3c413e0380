use std::fmt;
use std::sync::Arc;

use axum::{body::Body, http::Request};

use super::authenticate::Authenticator;
use super::cookie::{CookieOptions, is_valid_cookie_name};
use super::locator::{TokenLocator, TokenSource};
use crate::config::ConfigError;
use crate::identity::ContextKey;
use crate::services::resolver::{ResolverAdapter, ResolverParams};

pub const DEFAULT_AUTH_HEADER: &str = "Authorization";
pub const DEFAULT_AUTH_COOKIE: &str = "auth";

/// Authenticator settings. Validated once by [`AuthOptions::build`].
///
/// ```ignore
/// let auth = AuthOptions::new(ResolverParams::pool("eu-west-1", "eu-west-1_AbCdEf"))
///     .auto_refresh_cookie(CookieOptions::new().path("/").http_only(true))
///     .build()?;
/// let router = auth.apply(router);
/// ```
pub struct AuthOptions {
    auth_header: Option<String>,
    auth_cookie: Option<String>,
    resolver: ResolverParams,
    source: Option<TokenSource>,
    auto_refresh_cookie: Option<CookieOptions>,
    context_key: ContextKey,
}

impl AuthOptions {
    /// Defaults: `Authorization` header, `auth` cookie, no auto refresh, key `user`.
    pub fn new(resolver: ResolverParams) -> Self {
        Self {
            auth_header: Some(DEFAULT_AUTH_HEADER.to_string()),
            auth_cookie: Some(DEFAULT_AUTH_COOKIE.to_string()),
            resolver,
            source: None,
            auto_refresh_cookie: None,
            context_key: ContextKey::default(),
        }
    }

    pub fn auth_header(mut self, name: impl Into<String>) -> Self {
        self.auth_header = Some(name.into());
        self
    }

    pub fn without_auth_header(mut self) -> Self {
        self.auth_header = None;
        self
    }

    /// Cookie read as a token fallback, and written on refresh.
    pub fn auth_cookie(mut self, name: impl Into<String>) -> Self {
        self.auth_cookie = Some(name.into());
        self
    }

    pub fn without_auth_cookie(mut self) -> Self {
        self.auth_cookie = None;
        self
    }

    /// Replaces header/cookie extraction. The auth cookie is still used for refresh.
    pub fn source<F>(mut self, source: F) -> Self
    where
        F: Fn(&Request<Body>) -> Option<String> + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Enables the auth cookie refresh on every response carrying a resolved identity.
    pub fn auto_refresh_cookie(mut self, options: CookieOptions) -> Self {
        self.auto_refresh_cookie = Some(options);
        self
    }

    pub fn context_key(mut self, key: ContextKey) -> Self {
        self.context_key = key;
        self
    }

    pub fn build(self) -> Result<Authenticator, ConfigError> {
        let locator = match self.source {
            Some(source) => TokenLocator::Custom(source),
            None => TokenLocator::from_names(
                self.auth_header.as_deref(),
                self.auth_cookie.as_deref(),
            )?,
        };

        let cookie_name = match self.auth_cookie.as_deref().filter(|c| !c.is_empty()) {
            Some(name) if !is_valid_cookie_name(name) => {
                return Err(ConfigError::InvalidCookieName(name.to_string()));
            }
            Some(name) => Some(Arc::<str>::from(name)),
            None => None,
        };

        if self.auto_refresh_cookie.is_some() && cookie_name.is_none() {
            return Err(ConfigError::Invalid("auto_refresh_cookie requires auth_cookie"));
        }

        let resolver = ResolverAdapter::new(self.resolver.into_resolver()?);

        tracing::debug!(
            locator = ?locator,
            cookie = ?cookie_name,
            auto_refresh = self.auto_refresh_cookie.is_some(),
            context_key = %self.context_key,
            "authenticator configured"
        );

        Ok(Authenticator::new(
            locator,
            resolver,
            cookie_name,
            self.auto_refresh_cookie,
            self.context_key,
        ))
    }
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOptions")
            .field("auth_header", &self.auth_header)
            .field("auth_cookie", &self.auth_cookie)
            .field("resolver", &self.resolver)
            .field("source", &self.source.is_some())
            .field("auto_refresh_cookie", &self.auto_refresh_cookie)
            .field("context_key", &self.context_key)
            .finish()
    }
}
