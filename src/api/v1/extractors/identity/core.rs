use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::identity::{Identity, lookup};
use crate::state::AppState;

/// Handler で、 Identity を受け取るための extractor
/// Authenticator が AppState.identity_key に Identity を置いている前提
/// 見つからない場合は 401 を返す（未認証・Authenticator 未設定）
pub struct CurrentIdentity(pub Arc<Identity>);

impl FromRequestParts<AppState> for CurrentIdentity
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        lookup(&parts.extensions, &state.identity_key)
            .identity()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AppError::Unauthorized)
    }
}
