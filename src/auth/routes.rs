//! Authentication routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::extractors::require_auth;
use super::{handlers, oauth};

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/v1/signup` - Password signup
/// - `POST /api/v1/signup/oauth` - Signup for the pending OAuth identity
/// - `POST /api/v1/login` - Password login
/// - `GET /api/v1/login/oauth` - Login for the pending OAuth identity
/// - `POST /api/v1/token/refresh` - Exchange a refresh token for a new pair
/// - `GET /oauth/start/:action` - Redirect to the provider (`signup` or `login`)
/// - `GET /oauth/callback` - Provider redirect target
/// - `GET /api/v1/me` - Current account, bearer token required
/// - `GET /health` - Liveness
pub fn auth_routes() -> Router {
    let protected = Router::new()
        .route("/api/v1/me", get(handlers::me_handler))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/v1/signup", post(handlers::signup))
        .route("/api/v1/signup/oauth", post(handlers::signup_using_oauth))
        .route("/api/v1/login", post(handlers::login))
        .route("/api/v1/login/oauth", get(handlers::login_using_oauth))
        .route("/api/v1/token/refresh", post(handlers::refresh_token))
        .route("/oauth/start/:action", get(oauth::oauth_start))
        .route("/oauth/callback", get(oauth::oauth_callback))
        .route("/health", get(handlers::health))
        .merge(protected)
}
