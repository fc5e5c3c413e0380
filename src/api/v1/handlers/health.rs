/*
 * Responsibility
 * - liveness 確認用 (認証不要)
 */
pub async fn health() -> &'static str {
    "ok"
}
