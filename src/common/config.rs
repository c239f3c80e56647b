// src/common/config.rs
//! Process configuration loaded once at startup and passed down through `AppState`.

use anyhow::Context;
use std::env;
use std::str::FromStr;

/// Issuer and audience stamped into every token we mint.
pub const TOKEN_ISSUER: &str = "github.com/daiki-kim/tweet-app";
pub const TOKEN_AUDIENCE: &str = "github.com/daiki-kim/tweet-app";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    pub tokens: TokenConfig,
    pub oauth: OAuthConfig,
}

/// Signing material and lifetimes for access and refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_sign_key: String,
    pub access_verify_key: String,
    pub refresh_sign_key: String,
    pub refresh_verify_key: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub signup_redirect_url: String,
    pub login_redirect_url: String,
    pub pending_session_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let cors_origins = env_or(
            "CORS_ORIGINS",
            "http://localhost:3000,http://localhost:5173",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        Ok(Self {
            port: parse_env("PORT", 8080)?,
            database_url: env_or("DATABASE_URL", "sqlite://tweet_app.db"),
            cors_origins,
            cookie_secure: env_or("COOKIE_SECURE", "false").to_lowercase() == "true",
            tokens: TokenConfig::from_env()?,
            oauth: OAuthConfig::from_env()?,
        })
    }
}

impl TokenConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            access_sign_key: env_or("TOKEN_SIGN_KEY", "secret"),
            access_verify_key: env_or("TOKEN_VERIFY_KEY", "secret"),
            refresh_sign_key: env_or("REFRESH_TOKEN_SIGN_KEY", "secret"),
            refresh_verify_key: env_or("REFRESH_TOKEN_VERIFY_KEY", "secret"),
            access_ttl_secs: parse_env("ACCESS_TOKEN_TTL_SECS", 600)?,
            refresh_ttl_secs: parse_env("REFRESH_TOKEN_TTL_SECS", 3600)?,
            issuer: TOKEN_ISSUER.to_string(),
            audience: TOKEN_AUDIENCE.to_string(),
        })
    }
}

impl OAuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            client_id: env_or("GOOGLE_CLIENT_ID", ""),
            client_secret: env_or("GOOGLE_CLIENT_SECRET", ""),
            redirect_url: env_or("GOOGLE_REDIRECT_URL", "http://localhost:8080/oauth/callback"),
            auth_url: env_or("GOOGLE_AUTH_URL", GOOGLE_AUTH_URL),
            token_url: env_or("GOOGLE_TOKEN_URL", GOOGLE_TOKEN_URL),
            userinfo_url: env_or("GOOGLE_API_URL", GOOGLE_USERINFO_URL),
            signup_redirect_url: env_or(
                "SIGNUP_REDIRECT_URL",
                "http://localhost:3000/signup/oauth",
            ),
            login_redirect_url: env_or(
                "LOGIN_REDIRECT_URL",
                "http://localhost:8080/api/v1/login/oauth",
            ),
            pending_session_ttl_secs: parse_env("PENDING_SESSION_TTL_SECS", 600)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        env::remove_var("TWEET_AUTH_TEST_UNSET");
        let value: i64 = parse_env("TWEET_AUTH_TEST_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        env::set_var("TWEET_AUTH_TEST_GARBAGE", "ten minutes");
        let result: anyhow::Result<i64> = parse_env("TWEET_AUTH_TEST_GARBAGE", 600);
        assert!(result.is_err());
        env::remove_var("TWEET_AUTH_TEST_GARBAGE");
    }
}
