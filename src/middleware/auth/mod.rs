/*!
 * Request authentication and authorization
 *
 * Responsibility:
 * - Authenticator: token 取り出し → resolver → Identity を extensions に載せる (拒否しない)
 * - guard: extensions の Identity を見て 401/403 を返す
 * - cookie: auth cookie の読み書き、response header 前の自動更新
 */

pub mod authenticate;
pub mod cookie;
pub mod guard;
pub mod hook;
pub mod locator;
pub mod options;

pub use authenticate::Authenticator;
pub use cookie::{CookieOptions, SameSite};
pub use guard::{Guard, Validator, has_group, has_scope, is_allowed, is_authenticated, validator_fn};
pub use hook::BeforeHeaders;
pub use locator::{TokenLocator, TokenSource};
pub use options::{AuthOptions, DEFAULT_AUTH_COOKIE, DEFAULT_AUTH_HEADER};
