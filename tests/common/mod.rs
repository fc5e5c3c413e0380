#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Extension, Router,
    body::Body,
    http::{Request, Response, header},
    routing::{MethodRouter, get},
};
use cognito_gate::identity::IdentityContext;
use cognito_gate::{Claims, ContextKey, IdentityResolver, ResolveError};
use tower::ServiceExt;

/// Resolver backed by a fixed token table. Counts calls.
#[derive(Clone, Default)]
pub struct MapResolver {
    tokens: HashMap<String, Claims>,
    calls: Arc<AtomicUsize>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, claims: Claims) -> Self {
        self.tokens.insert(token.to_string(), claims);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl IdentityResolver for MapResolver {
    async fn resolve(&self, token: &str) -> Result<Claims, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .cloned()
            .ok_or(ResolveError::UnknownKey(None))
    }
}

/// GET handler answering with the token of the identity under `key`, or "anonymous".
pub fn echo_token(key: ContextKey) -> MethodRouter {
    get(move |Extension(ctx): Extension<IdentityContext>| {
        let key = key.clone();
        async move {
            ctx.lookup(&key)
                .identity()
                .map(|identity| identity.token().to_string())
                .unwrap_or_else(|| "anonymous".to_string())
        }
    })
}

pub struct RequestSpec<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub bearer: Option<&'a str>,
    pub cookie: Option<&'a str>,
}

impl<'a> RequestSpec<'a> {
    pub fn get(uri: &'a str) -> Self {
        Self {
            method: "GET",
            uri,
            bearer: None,
            cookie: None,
        }
    }

    pub fn post(uri: &'a str) -> Self {
        Self {
            method: "POST",
            ..Self::get(uri)
        }
    }

    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }

    pub fn cookie(mut self, cookie: &'a str) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder()
            .method(self.method)
            .uri(self.uri)
            .header(header::HOST, "example.com:8080");
        if let Some(token) = self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }
}

pub async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
