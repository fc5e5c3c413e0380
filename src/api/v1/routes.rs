/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 各 route に必要な guard をここで route_layer として適用する
 *   - /health: 認証不要
 *   - /me, /session: is_authenticated
 *   - /admin/summary: has_group("admin")
 *   - /reports: has_scope("reports/read")
 *   - /billing: is_allowed(BillingAccess)
 */
use async_trait::async_trait;
use axum::{
    Router,
    http::{Method, request::Parts},
    routing::{get, post},
};

use crate::middleware::auth::{Validator, has_group, has_scope, is_allowed, is_authenticated};
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    profile::{admin_summary, billing, me, refresh_session, reports},
};

pub const ADMIN_GROUP: &str = "admin";
pub const REPORTS_SCOPE: &str = "reports/read";

/// Members of `billing` may do anything; `billing/read` scope only reads.
pub struct BillingAccess;

#[async_trait]
impl Validator for BillingAccess {
    async fn validate(&self, request: &Parts, groups: &[String], scopes: &[String]) -> bool {
        if groups.iter().any(|g| g == "billing") {
            return true;
        }
        request.method == Method::GET && scopes.iter().any(|s| s == "billing/read")
    }
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let key = &state.identity_key;

    let public = Router::new().route("/health", get(health));

    let session = is_authenticated(key).apply(
        Router::new()
            .route("/me", get(me))
            .route("/session", post(refresh_session)),
    );

    let admin =
        has_group(key, ADMIN_GROUP).apply(Router::new().route("/admin/summary", get(admin_summary)));

    let scoped =
        has_scope(key, REPORTS_SCOPE).apply(Router::new().route("/reports", get(reports)));

    let validated =
        is_allowed(key, BillingAccess).apply(Router::new().route("/billing", get(billing)));

    Router::new()
        .merge(public)
        .merge(session)
        .merge(admin)
        .merge(scoped)
        .merge(validated)
}
