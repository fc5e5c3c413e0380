/*
 * Responsibility
 * - 認証済み identity を使う handler 群
 * - 認可 (group / scope / validator) は routes 側の guard で済んでいる前提
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::v1::{
    dto::profile::{MessageResponse, ProfileResponse},
    extractors::CurrentIdentity,
};

pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(identity.as_ref()))
}

pub async fn admin_summary(CurrentIdentity(identity): CurrentIdentity) -> Json<MessageResponse> {
    Json(message("admin area", &identity))
}

pub async fn reports(CurrentIdentity(identity): CurrentIdentity) -> Json<MessageResponse> {
    Json(message("reports", &identity))
}

pub async fn billing(CurrentIdentity(identity): CurrentIdentity) -> Json<MessageResponse> {
    Json(message("billing", &identity))
}

/// Persists the presented token into the auth cookie (e.g. after a bearer-only login).
pub async fn refresh_session(CurrentIdentity(identity): CurrentIdentity) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    identity.set_auth_cookie(response.headers_mut(), None);
    response
}

fn message(message: &'static str, identity: &crate::identity::Identity) -> MessageResponse {
    MessageResponse {
        message,
        sub: identity
            .claim("sub")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}
