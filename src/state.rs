/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - identity_key: Authenticator が Identity を置く ContextKey (extractor が読む)
 * - Clone 前提で持つ (内部は Clone cheap)
 */
use crate::identity::ContextKey;

#[derive(Clone, Debug)]
pub struct AppState {
    pub identity_key: ContextKey,
}

impl AppState {
    pub fn new(identity_key: ContextKey) -> Self {
        Self { identity_key }
    }
}
