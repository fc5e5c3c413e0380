//! Cognito-style token authentication and authorization guards for axum.
//!
//! - [`Authenticator`] finds a token (header and/or cookie), resolves it into an
//!   [`Identity`] and attaches it to the request. It never rejects a request.
//! - Guards ([`is_authenticated`], [`has_group`], [`has_scope`], [`is_allowed`]) read that
//!   identity and answer 401 / 403.
//! - With auto refresh on, the auth cookie is rewritten once per response when the
//!   request presented a token the cookie does not hold yet.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod services;
pub mod state;

pub use config::ConfigError;
pub use error::AppError;
pub use identity::{Claims, ContextKey, DEFAULT_CONTEXT_KEY, Identity};
pub use middleware::auth::{
    AuthOptions, Authenticator, CookieOptions, Guard, SameSite, Validator, has_group, has_scope,
    is_allowed, is_authenticated, validator_fn,
};
pub use services::resolver::{IdentityResolver, MultiPoolResolver, ResolveError, ResolverParams};
