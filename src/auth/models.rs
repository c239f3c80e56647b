//! Authentication data models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Which of the two tokens a claim set belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
///
/// `sub` carries the user's email.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, empty for OAuth-only accounts.
    #[serde(skip_serializing)]
    pub password: String,
    pub dob: NaiveDate,
    pub created_at: String,
}

/// Row to insert; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub dob: NaiveDate,
}

/// Access and refresh token returned by a successful login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub dob: String,
}

/// Body of `POST /api/v1/signup/oauth`; name and email come from the pending session.
#[derive(Deserialize, Debug, Default)]
pub struct OAuthSignupRequest {
    pub dob: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Identity fetched from the provider, held server side until signup or login completes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PendingOAuthIdentity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub dob: Option<String>,
}

/// What the browser asked for when it started the OAuth dance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OAuthAction {
    Signup,
    Login,
}

impl OAuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthAction::Signup => "signup",
            OAuthAction::Login => "login",
        }
    }
}

impl fmt::Display for OAuthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(OAuthAction::Signup),
            "login" => Ok(OAuthAction::Login),
            _ => Err(()),
        }
    }
}

/// Decoded form of the `state` parameter sent to the provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OAuthStatePayload {
    pub state: String,
    pub action: String,
}

/// Query parameters the provider appends to the callback URL
#[derive(Deserialize, Debug, Default)]
pub struct OAuthCallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}
