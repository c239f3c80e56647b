//! Authentication error taxonomy
//!
//! Every failure in the auth core is one of these variants. Handlers map them to
//! HTTP statuses through `From<AuthError> for ApiError`; nothing switches on
//! message text.

use thiserror::Error;

use super::repository::RepositoryError;
use crate::common::{ApiError, ValidationResult};
use crate::services::OAuthError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to hash password")]
    Hashing(String),

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("failed to persist user")]
    Persistence(String),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("no pending OAuth identity for this session")]
    SessionMissing,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token is malformed")]
    MalformedToken,

    #[error("token claims are invalid")]
    InvalidTokenClaims,

    #[error("failed to issue token")]
    TokenIssue(String),

    #[error("Authorization header is required")]
    MissingAuthHeader,

    #[error("Invalid authorization header")]
    MalformedAuthHeader,

    #[error("Token is required")]
    EmptyToken,

    #[error("OAuth state cookie is missing")]
    OAuthStateMissing,

    #[error("state does not match")]
    OAuthStateMismatch,

    #[error("invalid OAuth action")]
    InvalidOAuthAction,

    #[error("identity provider error: {0}")]
    UpstreamProvider(String),

    #[error("auth service error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AuthError::UserNotFound,
            RepositoryError::DuplicateEmail => AuthError::DuplicateEmail,
            RepositoryError::Database(e) => AuthError::Persistence(e.to_string()),
        }
    }
}

impl From<ValidationResult> for AuthError {
    fn from(result: ValidationResult) -> Self {
        let messages: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        AuthError::Validation(messages.join(", "))
    }
}

impl From<OAuthError> for AuthError {
    fn from(err: OAuthError) -> Self {
        AuthError::UpstreamProvider(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::Validation(_) => ApiError::ValidationError(message),
            AuthError::SessionMissing
            | AuthError::OAuthStateMissing
            | AuthError::OAuthStateMismatch
            | AuthError::InvalidOAuthAction => ApiError::BadRequest(message),
            AuthError::UserNotFound => ApiError::NotFound(message),
            AuthError::DuplicateEmail => ApiError::Conflict(message),
            AuthError::InvalidPassword
            | AuthError::InvalidSignature
            | AuthError::ExpiredToken
            | AuthError::MalformedToken
            | AuthError::InvalidTokenClaims
            | AuthError::MissingAuthHeader
            | AuthError::MalformedAuthHeader
            | AuthError::EmptyToken => ApiError::Unauthorized(message),
            AuthError::UpstreamProvider(_) => ApiError::BadGateway(message),
            AuthError::Hashing(_)
            | AuthError::Persistence(_)
            | AuthError::TokenIssue(_)
            | AuthError::Internal(_) => ApiError::InternalServer(message),
        }
    }
}
