//! Auth cookie reading and writing.
//!
//! Only what the pipeline needs: read one cookie from the `Cookie` header, and render one
//! `Set-Cookie` value.

use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::{
    HeaderMap, HeaderValue, Request,
    header::{COOKIE, HOST, SET_COOKIE},
};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// `Set-Cookie` attributes.
///
/// Every field is optional so an override set can be merged over defaults field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// `overrides` fields that are set replace the fields of `self`.
    pub fn merge(self, overrides: &CookieOptions) -> Self {
        let o = overrides.clone();
        Self {
            expires: o.expires.or(self.expires),
            max_age: o.max_age.or(self.max_age),
            domain: o.domain.or(self.domain),
            path: o.path.or(self.path),
            secure: o.secure.or(self.secure),
            http_only: o.http_only.or(self.http_only),
            same_site: o.same_site.or(self.same_site),
        }
    }
}

/// Renders a `Set-Cookie` header value.
pub fn render_set_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut out = format!("{name}={value}");

    // write! into a String cannot fail
    if let Some(expires) = options.expires {
        let _ = write!(out, "; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT"));
    }
    if let Some(max_age) = options.max_age {
        let _ = write!(out, "; Max-Age={max_age}");
    }
    if let Some(domain) = options.domain.as_deref() {
        let _ = write!(out, "; Domain={domain}");
    }
    if let Some(path) = options.path.as_deref() {
        let _ = write!(out, "; Path={path}");
    }
    if options.secure == Some(true) {
        out.push_str("; Secure");
    }
    if options.http_only == Some(true) {
        out.push_str("; HttpOnly");
    }
    if let Some(same_site) = options.same_site {
        let _ = write!(out, "; SameSite={}", same_site.as_str());
    }

    out
}

/// Returns the value of cookie `name`, or `None` when missing or empty.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Host the request was addressed to, without the port.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    let raw = req
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())?;

    let host = if raw.starts_with('[') {
        // IPv6 literal: keep the brackets, drop the port
        raw.split_inclusive(']').next().unwrap_or(raw)
    } else {
        raw.split(':').next().unwrap_or(raw)
    };

    (!host.is_empty()).then(|| host.to_string())
}

/// Valid cookie name (RFC 6265 token).
pub fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

/// Per-request state `Identity::set_auth_cookie` works from: the configured cookie name,
/// what the request already carried, and where it was sent.
pub struct CookieBinding {
    name: Option<Arc<str>>,
    stored: Option<String>,
    host: Option<String>,
    written: AtomicBool,
}

impl CookieBinding {
    pub fn new(name: Option<Arc<str>>, stored: Option<String>, host: Option<String>) -> Self {
        Self {
            name,
            stored,
            host,
            written: AtomicBool::new(false),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, None, None)
    }

    /// Captures the stored cookie and host from `req`.
    pub fn capture<B>(name: Option<Arc<str>>, req: &Request<B>) -> Self {
        let stored = name
            .as_deref()
            .and_then(|name| read_cookie(req.headers(), name));
        Self::new(name, stored, request_host(req))
    }

    pub(crate) fn refresh(
        &self,
        token: &str,
        exp: i64,
        headers: &mut HeaderMap,
        overrides: Option<&CookieOptions>,
    ) -> bool {
        let Some(name) = self.name.as_deref() else {
            return false;
        };
        if self.stored.as_deref() == Some(token) {
            return false;
        }

        let mut options = CookieOptions {
            expires: DateTime::from_timestamp(exp, 0),
            domain: self.host.clone(),
            ..CookieOptions::default()
        };
        if let Some(overrides) = overrides {
            options = options.merge(overrides);
        }

        let value = match HeaderValue::from_str(&render_set_cookie(name, token, &options)) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, cookie = %name, "auth cookie is not a valid header value");
                return false;
            }
        };

        if self.written.swap(true, Ordering::AcqRel) {
            return false;
        }
        headers.append(SET_COOKIE, value);
        true
    }
}

impl fmt::Debug for CookieBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // stored value is a credential
        f.debug_struct("CookieBinding")
            .field("name", &self.name)
            .field("stored", &self.stored.is_some())
            .field("host", &self.host)
            .field("written", &self.written.load(Ordering::Acquire))
            .finish()
    }
}
