//! Token extraction from an incoming request.
//!
//! The locator is chosen once when the authenticator is built; per request it is a plain,
//! synchronous lookup.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderName, Request},
};

use super::cookie::{is_valid_cookie_name, read_cookie};
use crate::config::ConfigError;

/// Custom token source, replacing header/cookie extraction entirely.
pub type TokenSource = Arc<dyn Fn(&Request<Body>) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum TokenLocator {
    Header(HeaderName),
    Cookie(Arc<str>),
    /// Header first, cookie as fallback.
    HeaderOrCookie {
        header: HeaderName,
        cookie: Arc<str>,
    },
    Custom(TokenSource),
}

impl TokenLocator {
    /// Builds a header and/or cookie locator. Fails when neither is configured.
    pub fn from_names(header: Option<&str>, cookie: Option<&str>) -> Result<Self, ConfigError> {
        let header = header
            .filter(|h| !h.is_empty())
            .map(|h| {
                HeaderName::from_bytes(h.to_ascii_lowercase().as_bytes())
                    .map_err(|_| ConfigError::InvalidHeaderName(h.to_string()))
            })
            .transpose()?;

        let cookie = cookie
            .filter(|c| !c.is_empty())
            .map(|c| {
                if is_valid_cookie_name(c) {
                    Ok(Arc::<str>::from(c))
                } else {
                    Err(ConfigError::InvalidCookieName(c.to_string()))
                }
            })
            .transpose()?;

        match (header, cookie) {
            (None, None) => Err(ConfigError::NoTokenSource),
            (None, Some(cookie)) => Ok(Self::Cookie(cookie)),
            (Some(header), None) => Ok(Self::Header(header)),
            (Some(header), Some(cookie)) => Ok(Self::HeaderOrCookie { header, cookie }),
        }
    }

    pub fn custom<F>(source: F) -> Self
    where
        F: Fn(&Request<Body>) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(source))
    }

    pub fn locate(&self, req: &Request<Body>) -> Option<String> {
        match self {
            Self::Header(header) => from_header(req, header),
            Self::Cookie(cookie) => read_cookie(req.headers(), cookie),
            Self::HeaderOrCookie { header, cookie } => {
                from_header(req, header).or_else(|| read_cookie(req.headers(), cookie))
            }
            Self::Custom(source) => source(req).filter(|t| !t.is_empty()),
        }
    }
}

impl fmt::Debug for TokenLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(header) => f.debug_tuple("Header").field(header).finish(),
            Self::Cookie(cookie) => f.debug_tuple("Cookie").field(cookie).finish(),
            Self::HeaderOrCookie { header, cookie } => f
                .debug_struct("HeaderOrCookie")
                .field("header", header)
                .field("cookie", cookie)
                .finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn from_header(req: &Request<Body>, header: &HeaderName) -> Option<String> {
    let value = req.headers().get(header)?.to_str().ok()?.trim_start();
    let token = strip_bearer(value).trim();

    (!token.is_empty()).then(|| token.to_string())
}

// `Bearer <token>` is the common case; bare tokens are accepted as-is.
// A lone scheme leaves nothing, so the cookie fallback still applies.
fn strip_bearer(value: &str) -> &str {
    const SCHEME: &str = "bearer";

    match value.get(..SCHEME.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(SCHEME) => {
            let rest = &value[SCHEME.len()..];
            if rest.is_empty() || rest.starts_with([' ', '\t']) {
                rest
            } else {
                value
            }
        }
        _ => value,
    }
}
