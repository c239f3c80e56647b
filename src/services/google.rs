// src/services/google.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::common::config::OAuthConfig;

const GOOGLE_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";
const GOOGLE_PROFILE_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.profile";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth not configured")]
    NotConfigured,

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Identity returned by the provider's user-info endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderIdentity {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
}

impl ProviderIdentity {
    /// Display name, falling back to the local part of the email.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .or(self.given_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or_default().to_string())
    }
}

/// Authorization-code exchange with an external identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is redirected to, carrying `state`.
    fn authorization_url(&self, state: &str) -> String;

    /// Trade the callback `code` for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity, OAuthError>;
}

pub struct GoogleService {
    client: Client,
    config: OAuthConfig,
}

impl GoogleService {
    pub fn new(client: Client, config: OAuthConfig) -> Self {
        Self { client, config }
    }

    fn ensure_configured(&self) -> Result<(), OAuthError> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(OAuthError::NotConfigured);
        }
        Ok(())
    }
}

#[async_trait]
impl OAuthProvider for GoogleService {
    fn authorization_url(&self, state: &str) -> String {
        let scope_param = [GOOGLE_EMAIL_SCOPE, GOOGLE_PROFILE_SCOPE].join(" ");

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&scope_param),
            urlencoding::encode(state)
        );

        debug!("Generated Google OAuth authorization URL with scopes: {}", scope_param);
        auth_url
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        self.ensure_configured()?;

        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(OAuthError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let token_response = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))?;

        info!("Successfully exchanged authorization code for tokens");
        Ok(token_response.access_token)
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity, OAuthError> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "User info request failed");
            return Err(OAuthError::RequestFailed(format!(
                "user info returned HTTP {}",
                status
            )));
        }

        response
            .json::<ProviderIdentity>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))
    }
}
