//! Auth orchestrator
//!
//! Coordinates the credential store, password hasher, token issuer and pending
//! OAuth session store to implement password and OAuth signup/login.
//!
//! A pending OAuth identity is consumed by the first signup or login attempt that
//! reads it, whether or not that attempt succeeds; a failed attempt means the
//! browser has to go through the provider again.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{AuthError, AuthResult};
use super::jwt::TokenIssuer;
use super::models::{LoginRequest, NewUser, PendingOAuthIdentity, TokenPair, User};
use super::password::{hash_password, verify_password};
use super::repository::UserRepository;
use super::session::PendingSessionStore;
use super::validators::{AccountFields, AccountValidator, LoginValidator};
use crate::common::validation::parse_date;
use crate::common::{normalize_email, safe_email_log, Validator};

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenIssuer>,
    sessions: Arc<dyn PendingSessionStore>,
}

/// Validate account fields and build the row shared by both signup paths.
pub fn prepare_base_user(
    name: &str,
    email: &str,
    dob: &str,
    password: Option<&str>,
) -> AuthResult<NewUser> {
    let email = normalize_email(email);
    let result = AccountValidator.validate(&AccountFields {
        name,
        email: &email,
        dob,
        password,
    });
    if !result.is_valid {
        return Err(result.into());
    }

    let dob = parse_date(dob).map_err(|e| AuthError::Validation(format!("dob: {}", e)))?;

    Ok(NewUser {
        name: name.trim().to_string(),
        email,
        password: String::new(),
        dob,
    })
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenIssuer>,
        sessions: Arc<dyn PendingSessionStore>,
    ) -> Self {
        Self {
            users,
            tokens,
            sessions,
        }
    }

    /// Password signup. The password is stored only as an Argon2 hash.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        dob: &str,
        password: &str,
    ) -> AuthResult<User> {
        let mut user = prepare_base_user(name, email, dob, Some(password))?;

        let plaintext = password.to_string();
        user.password = tokio::task::spawn_blocking(move || hash_password(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        let created = self.users.create_user(user).await?;
        info!(
            user_id = created.id,
            email = %safe_email_log(&created.email),
            "User signed up with password"
        );
        Ok(created)
    }

    /// Create an account for the pending OAuth identity of `session_id`.
    ///
    /// `dob` from the request wins over any date already held in the session.
    pub async fn signup_using_oauth(
        &self,
        session_id: Option<&str>,
        dob: Option<&str>,
    ) -> AuthResult<User> {
        let pending = self.take_pending(session_id).await?;

        let dob = dob
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .or(pending.dob)
            .unwrap_or_default();

        let user = prepare_base_user(&pending.name, &pending.email, &dob, None)?;
        let created = self.users.create_user(user).await?;
        info!(
            user_id = created.id,
            email = %safe_email_log(&created.email),
            "User signed up via OAuth"
        );
        Ok(created)
    }

    /// Password login.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        let request = LoginRequest {
            email: normalize_email(email),
            password: password.to_string(),
        };
        let result = LoginValidator.validate(&request);
        if !result.is_valid {
            return Err(result.into());
        }

        let user = self.users.find_user_by_email(&request.email).await?;

        let stored = user.password.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&request.password, &stored))
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !matches {
            warn!(email = %safe_email_log(&user.email), "Login rejected: invalid password");
            return Err(AuthError::InvalidPassword);
        }

        let pair = self.issue_token_pair(&user.email)?;
        info!(user_id = user.id, email = %safe_email_log(&user.email), "User logged in");
        Ok(pair)
    }

    /// Login with the email of the pending OAuth identity of `session_id`.
    pub async fn login_using_oauth(&self, session_id: Option<&str>) -> AuthResult<TokenPair> {
        let pending = self.take_pending(session_id).await?;
        let email = normalize_email(&pending.email);

        let user = self.users.find_user_by_email(&email).await?;
        let pair = self.issue_token_pair(&user.email)?;
        info!(user_id = user.id, email = %safe_email_log(&user.email), "User logged in via OAuth");
        Ok(pair)
    }

    /// Trade a valid refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.tokens.verify_refresh_token(refresh_token.trim())?;
        let user = self.users.find_user_by_email(&claims.sub).await?;
        debug!(jti = %claims.jti, "Refresh token accepted");
        self.issue_token_pair(&user.email)
    }

    async fn take_pending(&self, session_id: Option<&str>) -> AuthResult<PendingOAuthIdentity> {
        let session_id = session_id.ok_or(AuthError::SessionMissing)?;
        self.sessions
            .take(session_id)
            .await
            .ok_or(AuthError::SessionMissing)
    }

    fn issue_token_pair(&self, email: &str) -> AuthResult<TokenPair> {
        let token = self.tokens.issue_access_token(email)?;
        let refresh_token = self.tokens.issue_refresh_token(email)?;
        Ok(TokenPair {
            token,
            refresh_token,
        })
    }
}
