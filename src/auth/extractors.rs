//! Request authorization gate and the `AuthedUser` extractor

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{AuthError, AuthResult};
use super::models::TokenKind;
use crate::common::{safe_email_log, ApiError, AppState};

/// Identity resolved by [`require_auth`] for the current request.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub email: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(header: Option<&HeaderValue>) -> AuthResult<&str> {
    let header = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingAuthHeader),
    };
    let header = header
        .to_str()
        .map_err(|_| AuthError::MalformedAuthHeader)?;

    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return Err(AuthError::MalformedAuthHeader);
    }

    let token = parts[1].trim();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token)
}

/// Middleware for protected routes: verifies the access token and attaches
/// the resolved [`AuthedUser`] to the request extensions.
pub async fn require_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = extract_bearer_token(request.headers().get(AUTHORIZATION)).map_err(|e| {
            warn!(path = %request.uri().path(), error = %e, "Authentication failed");
            e
        })?;
        state.jwt.verify(token, TokenKind::Access)?
    };

    debug!(email = %safe_email_log(&claims.sub), jti = %claims.jti, "Request authenticated");
    request
        .extensions_mut()
        .insert(AuthedUser { email: claims.sub });

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized(AuthError::MissingAuthHeader.to_string()))
    }
}
