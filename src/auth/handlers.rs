//! Authentication handlers

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use super::error::AuthError;
use super::extractors::AuthedUser;
use super::models::{LoginRequest, OAuthSignupRequest, RefreshRequest, SignupRequest, TokenPair};
use super::session::SESSION_COOKIE;
use crate::common::{safe_email_log, ApiError, AppState};

fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|s| !s.is_empty())
}

/// POST /api/v1/signup
///
/// # Request Body
/// ```json
/// {
///   "name": "testuser",
///   "email": "test@example.com",
///   "password": "testpassword",
///   "dob": "2020-01-01"
/// }
/// ```
///
/// Responds `201 Created` with no body.
pub async fn signup(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<StatusCode, ApiError> {
    info!(email = %safe_email_log(&payload.email), "Received signup request");

    state
        .auth_service
        .signup(&payload.name, &payload.email, &payload.dob, &payload.password)
        .await
        .map_err(|e| {
            error!(error = %e, "Signup failed");
            ApiError::from(e)
        })?;

    Ok(StatusCode::CREATED)
}

/// POST /api/v1/signup/oauth
///
/// Creates an account for the identity parked by the OAuth callback. The
/// session is read from the `session_id` cookie; the body may supply `dob`.
pub async fn signup_using_oauth(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    payload: Option<Json<OAuthSignupRequest>>,
) -> Result<StatusCode, ApiError> {
    let dob = payload.and_then(|Json(body)| body.dob);

    state
        .auth_service
        .signup_using_oauth(session_id(&jar).as_deref(), dob.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, "OAuth signup failed");
            ApiError::from(e)
        })?;

    Ok(StatusCode::CREATED)
}

/// POST /api/v1/login
///
/// # Response
/// ```json
/// {
///   "token": "<access token>",
///   "refresh_token": "<refresh token>"
/// }
/// ```
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    info!(email = %safe_email_log(&payload.email), "Received login request");

    let pair = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(pair))
}

/// GET /api/v1/login/oauth
pub async fn login_using_oauth(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state
        .auth_service
        .login_using_oauth(session_id(&jar).as_deref())
        .await?;
    Ok(Json(pair))
}

/// POST /api/v1/token/refresh
pub async fn refresh_token(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AuthError::EmptyToken.into());
    }
    let pair = state.auth_service.refresh(&payload.refresh_token).await?;
    Ok(Json(pair))
}

/// GET /api/v1/me
/// Returns the account behind the bearer token
pub async fn me_handler(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = state
        .users
        .find_user_by_email(&user.email)
        .await
        .map_err(AuthError::from)?;

    Ok(Json(json!({ "user": account })))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
