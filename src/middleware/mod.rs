/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証 (Authenticator) と認可 (guard)
 * - http: request-id / trace / timeout などの横断的な設定
 */
pub mod auth;
pub mod http;
