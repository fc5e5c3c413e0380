/*!
 * Resolved caller identity
 *
 * Responsibility:
 * - resolver が返した Claims に、元の token と cookie 更新の束縛を付けた Identity
 * - request extensions 上の置き場 (IdentityContext / ContextKey)
 *
 * Public API:
 * - Identity, Claims
 * - ContextKey, IdentityContext, Attachment, DEFAULT_CONTEXT_KEY
 */

mod claims;
mod context;

use std::fmt;

use axum::http::HeaderMap;

use crate::middleware::auth::cookie::{CookieBinding, CookieOptions};

pub use claims::{Claims, GROUPS_CLAIM, SCOPE_CLAIM};
pub use context::{Attachment, ContextKey, DEFAULT_CONTEXT_KEY, IdentityContext, lookup};

/// An authenticated caller, valid for a single request/response cycle.
pub struct Identity {
    claims: Claims,
    token: String,
    cookie: CookieBinding,
}

impl Identity {
    pub(crate) fn new(claims: Claims, token: String, cookie: CookieBinding) -> Self {
        Self {
            claims,
            token,
            cookie,
        }
    }

    /// An identity that never writes a cookie.
    #[cfg(test)]
    pub(crate) fn detached(claims: Claims, token: impl Into<String>) -> Self {
        Self::new(claims, token.into(), CookieBinding::disabled())
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Expiry in epoch seconds.
    pub fn exp(&self) -> i64 {
        self.claims.exp
    }

    pub fn groups(&self) -> Option<&[String]> {
        self.claims.groups.as_deref()
    }

    pub fn scopes(&self) -> Option<&[String]> {
        self.claims.scopes.as_deref()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.claims.has_group(group)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.claims.has_scope(scope)
    }

    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.claim(name)
    }

    /// The raw token this identity was resolved from.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Writes the auth cookie into `headers` when the request's stored cookie differs from
    /// this identity's token.
    ///
    /// `Expires` comes from `exp` and `Domain` from the request host; `overrides` wins over
    /// both. At most one cookie is written per identity; returns whether this call wrote it.
    pub fn set_auth_cookie(&self, headers: &mut HeaderMap, overrides: Option<&CookieOptions>) -> bool {
        self.cookie
            .refresh(&self.token, self.claims.exp, headers, overrides)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the token
        f.debug_struct("Identity")
            .field("claims", &self.claims)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}
