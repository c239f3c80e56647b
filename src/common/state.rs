// Application state shared across all handlers

use std::sync::Arc;

use super::config::AppConfig;
use crate::auth::jwt::JwtService;
use crate::auth::repository::UserRepository;
use crate::auth::service::AuthService;
use crate::auth::session::PendingSessionStore;
use crate::services::OAuthProvider;

/// Application state containing configuration and the auth collaborators
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: Arc<AuthService>,
    pub jwt: Arc<JwtService>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn PendingSessionStore>,
    pub oauth_provider: Arc<dyn OAuthProvider>,
}
