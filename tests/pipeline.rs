//! End-to-end behaviour of the authenticator and guards on an axum router.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::{
    Extension, Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use cognito_gate::identity::IdentityContext;
use cognito_gate::{
    AuthOptions, Authenticator, Claims, ConfigError, ContextKey, CookieOptions, Guard,
    ResolverParams, has_group, has_scope, is_allowed, is_authenticated, validator_fn,
};

use common::{MapResolver, RequestSpec, body_string, echo_token, send, set_cookies};

const EXP: i64 = 1999999999;
const EXP_HTTP_DATE: &str = "Wed, 18 May 2033 03:33:19 GMT";

fn resolver() -> MapResolver {
    MapResolver::new()
        .with("T1", Claims::new(EXP).with_groups(["admin"]))
        .with("AB", Claims::new(EXP).with_groups(["a", "b"]))
        .with("RW", Claims::new(EXP).with_scope("read write"))
        .with("PLAIN", Claims::new(EXP))
}

fn authenticator(resolver: MapResolver) -> Authenticator {
    AuthOptions::new(ResolverParams::instance(resolver))
        .build()
        .unwrap()
}

fn guarded(auth: &Authenticator, guard: Guard) -> Router {
    auth.apply(guard.apply(Router::new().route("/", echo_token(auth.context_key().clone()))))
}

async fn status_of(app: Router, req: RequestSpec<'_>) -> StatusCode {
    send(app, req.build()).await.status()
}

#[tokio::test]
async fn no_token_means_no_identity_and_401_everywhere() {
    let resolver = resolver();
    let calls = resolver.calls();
    let auth = authenticator(resolver);
    let key = auth.context_key().clone();

    for guard in [
        is_authenticated(&key),
        has_group(&key, "admin"),
        has_scope(&key, "read"),
    ] {
        let status = status_of(guarded(&auth, guard), RequestSpec::get("/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unauthenticated_request_still_reaches_unguarded_routes() {
    let auth = authenticator(resolver());
    let app = auth.apply(Router::new().route("/", echo_token(auth.context_key().clone())));

    let response = send(app, RequestSpec::get("/").build()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "anonymous");
}

#[tokio::test]
async fn invalid_token_is_treated_as_anonymous() {
    let resolver = resolver();
    let calls = resolver.calls();
    let auth = authenticator(resolver);
    let key = auth.context_key().clone();

    let status = status_of(
        guarded(&auth, is_authenticated(&key)),
        RequestSpec::get("/").bearer("forged"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn group_membership() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();

    for (group, expected) in [
        ("a", StatusCode::OK),
        ("b", StatusCode::OK),
        ("c", StatusCode::FORBIDDEN),
    ] {
        let status = status_of(
            guarded(&auth, has_group(&key, group)),
            RequestSpec::get("/").bearer("AB"),
        )
        .await;
        assert_eq!(status, expected, "group {group}");
    }
}

#[tokio::test]
async fn scope_membership() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();

    let read = status_of(
        guarded(&auth, has_scope(&key, "read")),
        RequestSpec::get("/").bearer("RW"),
    )
    .await;
    let admin = status_of(
        guarded(&auth, has_scope(&key, "admin")),
        RequestSpec::get("/").bearer("RW"),
    )
    .await;
    let no_scope = status_of(
        guarded(&auth, has_scope(&key, "read")),
        RequestSpec::get("/").bearer("PLAIN"),
    )
    .await;

    assert_eq!(read, StatusCode::OK);
    assert_eq!(admin, StatusCode::FORBIDDEN);
    assert_eq!(no_scope, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bearer_admin_scenario() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();

    let admin = send(
        guarded(&auth, has_group(&key, "admin")),
        RequestSpec::get("/").bearer("T1").build(),
    )
    .await;
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(body_string(admin).await, "T1");

    let billing = status_of(
        guarded(&auth, has_group(&key, "billing")),
        RequestSpec::get("/").bearer("T1"),
    )
    .await;
    assert_eq!(billing, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn is_allowed_consults_validator_without_identity() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();
    let seen_empty = Arc::new(AtomicBool::new(false));

    let seen = seen_empty.clone();
    let guard = is_allowed(
        &key,
        validator_fn(move |_, groups, scopes| {
            seen.store(groups.is_empty() && scopes.is_empty(), Ordering::SeqCst);
            true
        }),
    );

    let response = send(guarded(&auth, guard), RequestSpec::get("/").build()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(seen_empty.load(Ordering::SeqCst));
    assert_eq!(body_string(response).await, "anonymous");
}

#[tokio::test]
async fn is_allowed_denial_is_401_or_403() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();
    let deny = || is_allowed(&key, validator_fn(|_, _, _| false));

    let anonymous = status_of(guarded(&auth, deny()), RequestSpec::get("/")).await;
    let known = status_of(guarded(&auth, deny()), RequestSpec::get("/").bearer("T1")).await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(known, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn failing_guard_stops_the_pipeline() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();
    let reached = Arc::new(AtomicUsize::new(0));

    let counter = reached.clone();
    let later = is_allowed(
        &key,
        validator_fn(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }),
    );

    // The last route_layer applied runs first
    let routes = Router::new().route("/", echo_token(key.clone()));
    let routes = is_authenticated(&key).apply(later.apply(routes));
    let app = auth.apply(routes);

    let status = status_of(app, RequestSpec::get("/")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_is_authenticated_never_reaches_has_group() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();
    let reached = Arc::new(AtomicUsize::new(0));

    let counter = reached.clone();
    let routes = Router::new().route("/", echo_token(key.clone()));
    let routes = has_group(&key, "admin").apply(routes);
    let routes = routes.route_layer(axum::middleware::from_fn(
        move |req: axum::extract::Request, next: axum::middleware::Next| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                next.run(req).await
            }
        },
    ));
    let app = auth.apply(is_authenticated(&key).apply(routes));

    let anonymous = status_of(app.clone(), RequestSpec::get("/")).await;
    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(reached.load(Ordering::SeqCst), 0);

    let admin = status_of(app.clone(), RequestSpec::get("/").bearer("T1")).await;
    assert_eq!(admin, StatusCode::OK);

    let plain = status_of(app, RequestSpec::get("/").bearer("PLAIN")).await;
    assert_eq!(plain, StatusCode::FORBIDDEN);
    assert_eq!(reached.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn header_token_wins_over_cookie() {
    let auth = authenticator(resolver());

    let response = send(
        auth.apply(Router::new().route("/", echo_token(auth.context_key().clone()))),
        RequestSpec::get("/").bearer("T1").cookie("auth=AB").build(),
    )
    .await;

    assert_eq!(body_string(response).await, "T1");
}

#[tokio::test]
async fn cookie_token_is_used_without_header() {
    let auth = authenticator(resolver());

    let response = send(
        auth.apply(Router::new().route("/", echo_token(auth.context_key().clone()))),
        RequestSpec::get("/").cookie("theme=dark; auth=AB").build(),
    )
    .await;

    assert_eq!(body_string(response).await, "AB");
}

#[tokio::test]
async fn bare_bearer_scheme_falls_back_to_cookie() {
    let resolver = resolver();
    let calls = resolver.calls();
    let auth = authenticator(resolver);

    // `.bearer("")` sends `Authorization: Bearer `
    let response = send(
        auth.apply(Router::new().route("/", echo_token(auth.context_key().clone()))),
        RequestSpec::get("/").bearer("").cookie("auth=AB").build(),
    )
    .await;

    assert_eq!(body_string(response).await, "AB");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn header_only_configuration_never_reads_the_cookie() {
    let resolver = resolver();
    let calls = resolver.calls();
    let auth = AuthOptions::new(ResolverParams::instance(resolver))
        .without_auth_cookie()
        .build()
        .unwrap();
    let key = auth.context_key().clone();

    let status = status_of(
        guarded(&auth, is_authenticated(&key)),
        RequestSpec::get("/").cookie("auth=T1"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn custom_source_replaces_header_and_cookie() {
    let auth = AuthOptions::new(ResolverParams::instance(resolver()))
        .source(|req| req.headers().get("x-api-token")?.to_str().ok().map(str::to_string))
        .build()
        .unwrap();

    let req = axum::http::Request::builder()
        .uri("/")
        .header("x-api-token", "AB")
        .header(header::AUTHORIZATION, "Bearer T1")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(
        auth.apply(Router::new().route("/", echo_token(auth.context_key().clone()))),
        req,
    )
    .await;

    assert_eq!(body_string(response).await, "AB");
}

#[tokio::test]
async fn guards_only_read_their_own_context_key() {
    let principal = ContextKey::new("principal");
    let auth = AuthOptions::new(ResolverParams::instance(resolver()))
        .context_key(principal.clone())
        .build()
        .unwrap();

    let wrong_key = status_of(
        guarded(&auth, is_authenticated(&ContextKey::default())),
        RequestSpec::get("/").bearer("T1"),
    )
    .await;
    let right_key = status_of(
        guarded(&auth, is_authenticated(&principal)),
        RequestSpec::get("/").bearer("T1"),
    )
    .await;

    assert_eq!(wrong_key, StatusCode::UNAUTHORIZED);
    assert_eq!(right_key, StatusCode::OK);
}

#[tokio::test]
async fn absence_is_attached_explicitly() {
    let auth = authenticator(resolver());
    let key = auth.context_key().clone();

    let app = auth.apply(Router::new().route(
        "/",
        get(move |Extension(ctx): Extension<IdentityContext>| {
            let key = key.clone();
            async move {
                match ctx.lookup(&key) {
                    cognito_gate::identity::Attachment::Absent => "absent",
                    cognito_gate::identity::Attachment::Unchecked => "unchecked",
                    cognito_gate::identity::Attachment::Present(_) => "present",
                }
            }
        }),
    ));

    let response = send(app, RequestSpec::get("/").build()).await;
    assert_eq!(body_string(response).await, "absent");
}

fn refreshing(options: CookieOptions) -> Authenticator {
    AuthOptions::new(ResolverParams::instance(resolver()))
        .auto_refresh_cookie(options)
        .build()
        .unwrap()
}

#[tokio::test]
async fn refresh_writes_one_cookie_when_token_changes() {
    let auth = refreshing(CookieOptions::new().path("/").http_only(true));
    let app = auth.apply(Router::new().route("/", echo_token(auth.context_key().clone())));

    let response = send(
        app,
        RequestSpec::get("/").bearer("T1").cookie("auth=OLD").build(),
    )
    .await;

    assert_eq!(
        set_cookies(&response),
        vec![format!(
            "auth=T1; Expires={EXP_HTTP_DATE}; Domain=example.com; Path=/; HttpOnly"
        )]
    );
}

#[tokio::test]
async fn refresh_is_skipped_when_cookie_holds_the_token() {
    let auth = refreshing(CookieOptions::new().path("/"));
    let app = auth.apply(Router::new().route("/", echo_token(auth.context_key().clone())));

    let response = send(app, RequestSpec::get("/").cookie("auth=T1").build()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn refresh_needs_an_identity() {
    let auth = refreshing(CookieOptions::new().path("/"));
    let app = auth.apply(Router::new().route("/", echo_token(auth.context_key().clone())));

    let response = send(app, RequestSpec::get("/").bearer("forged").build()).await;

    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn refresh_options_override_domain_and_expiry() {
    let expires = chrono::DateTime::from_timestamp(1_000_000_000, 0).unwrap();
    let auth = refreshing(CookieOptions::new().domain(".example.com").expires(expires));
    let app = auth.apply(Router::new().route("/", echo_token(auth.context_key().clone())));

    let response = send(app, RequestSpec::get("/").bearer("T1").build()).await;

    assert_eq!(
        set_cookies(&response),
        vec!["auth=T1; Expires=Sun, 09 Sep 2001 01:46:40 GMT; Domain=.example.com".to_string()]
    );
}

#[tokio::test]
async fn handler_write_and_refresh_hook_share_one_cookie() {
    let auth = refreshing(CookieOptions::new().path("/"));
    let key = auth.context_key().clone();

    let app = auth.apply(Router::new().route(
        "/",
        get(move |Extension(ctx): Extension<IdentityContext>| {
            let key = key.clone();
            async move {
                let mut response = StatusCode::NO_CONTENT.into_response();
                if let Some(identity) = ctx.lookup(&key).identity() {
                    identity.set_auth_cookie(response.headers_mut(), None);
                }
                response
            }
        }),
    ));

    let response = send(app, RequestSpec::get("/").bearer("T1").build()).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        set_cookies(&response),
        vec![format!("auth=T1; Expires={EXP_HTTP_DATE}; Domain=example.com")]
    );
}

#[tokio::test]
async fn refresh_also_applies_to_guard_rejections() {
    let auth = refreshing(CookieOptions::new().path("/"));
    let key = auth.context_key().clone();

    let response = send(
        guarded(&auth, has_group(&key, "billing")),
        RequestSpec::get("/").bearer("T1").build(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(set_cookies(&response).len(), 1);
}

#[test]
fn configuration_errors_fail_at_build_time() {
    let no_source = AuthOptions::new(ResolverParams::instance(resolver()))
        .without_auth_header()
        .without_auth_cookie()
        .build();
    assert!(matches!(no_source, Err(ConfigError::NoTokenSource)));

    let refresh_without_cookie = AuthOptions::new(ResolverParams::instance(resolver()))
        .without_auth_cookie()
        .auto_refresh_cookie(CookieOptions::new())
        .build();
    assert!(matches!(refresh_without_cookie, Err(ConfigError::Invalid(_))));

    let empty_pool = AuthOptions::new(ResolverParams::pool("", "")).build();
    assert!(matches!(empty_pool, Err(ConfigError::Missing(_))));
}
