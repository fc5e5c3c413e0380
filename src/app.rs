/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → Authenticator 構築 → Router 組み立て
 * - Middleware の適用 (Authenticator → guard は routes 側, http は最外周)
 * - axum::serve() で起動
 */
use std::{panic, process, time::Duration};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::{self, auth::Authenticator};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,cognito_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    let auth = config.auth_options().build()?;

    tracing::info!(
        addr = %config.addr,
        env = ?config.app_env,
        region = %config.cognito_region,
        user_pool_id = %config.cognito_user_pool_id,
        "starting API"
    );

    let state = AppState::new(auth.context_key().clone());
    let app = build_router(state, &auth, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState, auth: &Authenticator, config: &Config) -> Router {
    let v1 = auth.apply(api::v1::routes(&state));

    let router = Router::new().nest("/api/v1", v1).with_state(state);

    middleware::http::apply(
        router,
        Duration::from_secs(config.request_timeout_seconds),
    )
}
