/*
 * Responsibility
 * - 環境変数の読み込み (PORT, Cognito pool, token の取り出し元, cookie 更新設定)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 構築時の設定エラー (ConfigError): middleware の組み立てもここで fail fast する
 */
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::identity::ContextKey;
use crate::middleware::auth::{AuthOptions, CookieOptions, SameSite};
use crate::services::resolver::ResolverParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("no token source: configure a header, a cookie or a custom source")]
    NoTokenSource,
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),
    #[error("invalid cookie name: {0:?}")]
    InvalidCookieName(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout_seconds: u64,

    pub cognito_region: String,
    pub cognito_user_pool_id: String,

    pub auth_header: Option<String>,
    pub auth_cookie: Option<String>,
    pub auth_context_key: String,

    pub auth_cookie_refresh: bool,
    pub auth_cookie_secure: bool,
    pub auth_cookie_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let request_timeout_seconds = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let cognito_region = std::env::var("COGNITO_REGION")
            .map_err(|_| ConfigError::Missing("COGNITO_REGION"))?;

        let cognito_user_pool_id = std::env::var("COGNITO_USER_POOL_ID")
            .map_err(|_| ConfigError::Missing("COGNITO_USER_POOL_ID"))?;

        let auth_header = optional_name("AUTH_HEADER", "Authorization");
        let auth_cookie = optional_name("AUTH_COOKIE", "auth");

        let auth_context_key = std::env::var("AUTH_CONTEXT_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| crate::identity::DEFAULT_CONTEXT_KEY.to_string());

        let auth_cookie_refresh = flag("AUTH_COOKIE_REFRESH", false)?;
        let auth_cookie_secure = flag("AUTH_COOKIE_SECURE", app_env.is_production())?;
        let auth_cookie_path =
            std::env::var("AUTH_COOKIE_PATH").unwrap_or_else(|_| "/".to_string());

        Ok(Self {
            addr,
            app_env,
            request_timeout_seconds,
            cognito_region,
            cognito_user_pool_id,
            auth_header,
            auth_cookie,
            auth_context_key,
            auth_cookie_refresh,
            auth_cookie_secure,
            auth_cookie_path,
        })
    }

    pub fn context_key(&self) -> ContextKey {
        ContextKey::new(self.auth_context_key.clone())
    }

    /// Authenticator options for the configured Cognito pool.
    pub fn auth_options(&self) -> AuthOptions {
        let mut options = AuthOptions::new(ResolverParams::pool(
            &self.cognito_region,
            &self.cognito_user_pool_id,
        ))
        .context_key(self.context_key());

        options = match &self.auth_header {
            Some(header) => options.auth_header(header),
            None => options.without_auth_header(),
        };
        options = match &self.auth_cookie {
            Some(cookie) => options.auth_cookie(cookie),
            None => options.without_auth_cookie(),
        };

        if self.auth_cookie_refresh {
            options = options.auto_refresh_cookie(
                CookieOptions::new()
                    .path(self.auth_cookie_path.clone())
                    .secure(self.auth_cookie_secure)
                    .http_only(true)
                    .same_site(SameSite::Lax),
            );
        }

        options
    }
}

// Unset -> default; empty or "none" -> disabled.
fn optional_name(key: &str, default: &str) -> Option<String> {
    parse_optional_name(std::env::var(key).ok().as_deref(), default)
}

fn parse_optional_name(value: Option<&str>, default: &str) -> Option<String> {
    match value.map(str::trim) {
        None => Some(default.to_string()),
        Some(v) if v.is_empty() || v.eq_ignore_ascii_case("none") => None,
        Some(v) => Some(v.to_string()),
    }
}

fn flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    parse_flag(key, std::env::var(key).ok().as_deref(), default)
}

fn parse_flag(key: &'static str, value: Option<&str>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}
