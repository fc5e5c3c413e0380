//! token 取り出し → resolver → Identity を extensions に入れる
//!
//! - 認証「ゲート」ではない。identity が無くても必ず次へ進む (拒否は guard の責務)
//! - identity の有無に関わらず、設定された ContextKey に必ず書き込む
//! - cookie 自動更新が有効なら、response header が書かれる前に一度だけ Set-Cookie を足す

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use super::cookie::{CookieBinding, CookieOptions};
use super::hook::{CookieRefresh, intercept};
use super::locator::TokenLocator;
use crate::identity::{ContextKey, Identity, IdentityContext};
use crate::services::resolver::ResolverAdapter;

/// The authentication middleware. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Authenticator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    locator: TokenLocator,
    resolver: ResolverAdapter,
    cookie_name: Option<Arc<str>>,
    auto_refresh: Option<CookieOptions>,
    context_key: ContextKey,
}

impl Authenticator {
    pub(crate) fn new(
        locator: TokenLocator,
        resolver: ResolverAdapter,
        cookie_name: Option<Arc<str>>,
        auto_refresh: Option<CookieOptions>,
        context_key: ContextKey,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                locator,
                resolver,
                cookie_name,
                auto_refresh,
                context_key,
            }),
        }
    }

    /// Key guards must be built with to read what this authenticator attaches.
    pub fn context_key(&self) -> &ContextKey {
        &self.inner.context_key
    }

    /// Runs the authenticator in front of every route of `router`.
    ///
    /// Guards are applied on the inner routers, so they see the attached identity:
    /// ```ignore
    /// let admin = guard::has_group(auth.context_key(), "admin").apply(admin_routes);
    /// let app = auth.apply(Router::new().merge(public).merge(admin));
    /// ```
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self.clone(), authenticate))
    }

    async fn identify(&self, token: Option<String>, cookie: CookieBinding) -> Option<Arc<Identity>> {
        let claims = self.inner.resolver.resolve(token.as_deref()).await;

        claims
            .zip(token)
            .map(|(claims, token)| Arc::new(Identity::new(claims, token, cookie)))
    }
}

async fn authenticate(
    State(auth): State<Authenticator>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Nothing borrowed from `req` may live across the await below
    let token = auth.inner.locator.locate(&req);
    let cookie = CookieBinding::capture(auth.inner.cookie_name.clone(), &req);

    let identity = auth.identify(token, cookie).await;

    tracing::debug!(
        context_key = %auth.inner.context_key,
        authenticated = identity.is_some(),
        "identity attached"
    );

    let key = auth.inner.context_key.clone();
    match req.extensions_mut().get_mut::<IdentityContext>() {
        Some(ctx) => {
            if !ctx.attach(key, identity.clone()) {
                tracing::warn!(
                    context_key = %auth.inner.context_key,
                    "identity already attached under this key, keeping the first"
                );
            }
        }
        None => {
            let mut ctx = IdentityContext::default();
            ctx.attach(key, identity.clone());
            req.extensions_mut().insert(ctx);
        }
    }

    let hook = auth
        .inner
        .auto_refresh
        .clone()
        .zip(identity)
        .map(|(options, identity)| CookieRefresh::new(identity, options));

    intercept(next.run(req), hook).await
}
