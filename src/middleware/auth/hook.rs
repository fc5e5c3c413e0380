//! Before-headers interception.
//!
//! A hook gets the finished response of everything downstream and may touch its headers
//! before the response is handed back to the server for writing. It cannot replace the
//! response: whatever downstream returned is what goes out.

use std::future::Future;
use std::sync::Arc;

use axum::response::Response;

use super::cookie::CookieOptions;
use crate::identity::Identity;

/// Side effect applied to a response right before its headers are written.
///
/// Consumed on use, so a hook fires at most once.
pub trait BeforeHeaders: Send {
    fn before_headers(self, response: &mut Response);
}

impl<H: BeforeHeaders> BeforeHeaders for Option<H> {
    fn before_headers(self, response: &mut Response) {
        if let Some(hook) = self {
            hook.before_headers(response);
        }
    }
}

/// Awaits `downstream`, runs `hook` on its response, and returns that response.
pub async fn intercept<F, H>(downstream: F, hook: H) -> Response
where
    F: Future<Output = Response>,
    H: BeforeHeaders,
{
    let mut response = downstream.await;
    hook.before_headers(&mut response);
    response
}

/// Writes the refreshed auth cookie for a resolved identity.
pub struct CookieRefresh {
    identity: Arc<Identity>,
    options: CookieOptions,
}

impl CookieRefresh {
    pub fn new(identity: Arc<Identity>, options: CookieOptions) -> Self {
        Self { identity, options }
    }
}

impl BeforeHeaders for CookieRefresh {
    fn before_headers(self, response: &mut Response) {
        if self
            .identity
            .set_auth_cookie(response.headers_mut(), Some(&self.options))
        {
            tracing::debug!("auth cookie refreshed");
        }
    }
}
