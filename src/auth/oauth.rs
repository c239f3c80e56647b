//! OAuth redirect/callback exchange
//!
//! `GET /oauth/start/:action` stores an encoded `{state, action}` value in the
//! `oauth_state` cookie and redirects to the provider with the same value as
//! `state`. The callback compares the two, exchanges the code, stores the
//! provider identity as a pending session and redirects to the signup or login
//! completion URL.

use axum::{
    extract::{Extension, Path, Query},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::error::{AuthError, AuthResult};
use super::models::{OAuthAction, OAuthCallbackParams, OAuthStatePayload, PendingOAuthIdentity};
use super::session::{PendingSessionStore, SESSION_COOKIE};
use crate::common::{normalize_email, random_url_token, safe_email_log, ApiError, AppState};
use crate::services::OAuthProvider;

pub const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_MAX_AGE_SECS: i64 = 3600;

/// Encode the nonce and the requested action into the `state` value.
pub fn encode_state(nonce: &str, action: OAuthAction) -> AuthResult<String> {
    let payload = OAuthStatePayload {
        state: nonce.to_string(),
        action: action.as_str().to_string(),
    };
    let json = serde_json::to_vec(&payload).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_state(encoded: &str) -> AuthResult<OAuthAction> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| AuthError::Internal("failed to decode state".to_string()))?;
    let payload: OAuthStatePayload = serde_json::from_slice(&bytes)
        .map_err(|_| AuthError::Internal("failed to unmarshal state".to_string()))?;
    payload
        .action
        .parse()
        .map_err(|_| AuthError::InvalidOAuthAction)
}

/// Validate the callback against the cookie-held state, then fetch the provider
/// identity and park it under `session_id`.
///
/// The state check runs before anything is sent to the provider.
pub async fn complete_oauth(
    provider: &dyn OAuthProvider,
    sessions: &dyn PendingSessionStore,
    session_id: &str,
    cookie_state: Option<&str>,
    params: &OAuthCallbackParams,
) -> AuthResult<OAuthAction> {
    let cookie_state = cookie_state.ok_or(AuthError::OAuthStateMissing)?;
    let query_state = params
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::OAuthStateMismatch)?;

    // plain equality, see DESIGN.md
    if query_state != cookie_state {
        return Err(AuthError::OAuthStateMismatch);
    }

    let action = decode_state(query_state)?;

    if let Some(provider_error) = &params.error {
        return Err(AuthError::UpstreamProvider(provider_error.clone()));
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::UpstreamProvider("no authorization code provided".to_string()))?;

    let access_token = provider.exchange_code(code).await?;
    let identity = provider.fetch_identity(&access_token).await?;

    let pending = PendingOAuthIdentity {
        name: identity.display_name(),
        email: normalize_email(&identity.email),
        dob: None,
    };
    debug!(email = %safe_email_log(&pending.email), action = %action, "Storing pending OAuth identity");
    sessions.set(session_id, pending).await;

    Ok(action)
}

/// GET /oauth/start/:action
pub async fn oauth_start(
    Extension(state): Extension<Arc<AppState>>,
    Path(action): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let action: OAuthAction = action.parse().map_err(|_| {
        warn!(action = %action, "Rejected OAuth start with unknown action");
        AuthError::InvalidOAuthAction
    })?;

    let encoded_state = encode_state(&random_url_token(32), action)?;

    let cookie = Cookie::build((STATE_COOKIE, encoded_state.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(STATE_COOKIE_MAX_AGE_SECS));

    let auth_url = state.oauth_provider.authorization_url(&encoded_state);
    info!(action = %action, "Redirecting to identity provider");

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// GET /oauth/callback
///
/// The state cookie is dropped whether or not the callback succeeds.
pub async fn oauth_callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<OAuthCallbackParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), (CookieJar, ApiError)> {
    let cookie_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| random_url_token(32));

    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    let action = match complete_oauth(
        state.oauth_provider.as_ref(),
        state.sessions.as_ref(),
        &session_id,
        cookie_state.as_deref(),
        &params,
    )
    .await
    {
        Ok(action) => action,
        Err(e) => {
            error!(error = %e, "OAuth callback failed");
            return Err((jar, e.into()));
        }
    };

    let session_cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.config.oauth.pending_session_ttl_secs,
        ));

    let target = match action {
        OAuthAction::Signup => &state.config.oauth.signup_redirect_url,
        OAuthAction::Login => &state.config.oauth.login_redirect_url,
    };
    info!(action = %action, "OAuth callback completed, redirecting");

    Ok((jar.add(session_cookie), Redirect::to(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::InMemorySessionStore;
    use crate::services::{OAuthError, ProviderIdentity};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        exchanges: AtomicUsize,
        fail_user_info: bool,
    }

    #[async_trait]
    impl OAuthProvider for FakeProvider {
        fn authorization_url(&self, state: &str) -> String {
            format!("https://provider.test/auth?state={state}")
        }

        async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            Ok(format!("access-for-{code}"))
        }

        async fn fetch_identity(&self, _access_token: &str) -> Result<ProviderIdentity, OAuthError> {
            if self.fail_user_info {
                return Err(OAuthError::RequestFailed("user info returned HTTP 500".into()));
            }
            Ok(ProviderIdentity {
                email: "Test@Example.com".to_string(),
                name: Some("testuser".to_string()),
                given_name: None,
            })
        }
    }

    fn params(state: Option<&str>, code: Option<&str>) -> OAuthCallbackParams {
        OAuthCallbackParams {
            state: state.map(str::to_string),
            code: code.map(str::to_string),
            error: None,
        }
    }

    #[test]
    fn test_state_encoding_carries_action() {
        let encoded = encode_state("nonce", OAuthAction::Login).unwrap();
        assert_eq!(decode_state(&encoded).unwrap(), OAuthAction::Login);

        let encoded = encode_state("nonce", OAuthAction::Signup).unwrap();
        assert_eq!(decode_state(&encoded).unwrap(), OAuthAction::Signup);
    }

    #[test]
    fn test_unknown_action_in_state() {
        let forged = URL_SAFE_NO_PAD.encode(r#"{"state":"x","action":"admin"}"#);
        assert!(matches!(
            decode_state(&forged),
            Err(AuthError::InvalidOAuthAction)
        ));
    }

    #[tokio::test]
    async fn test_callback_success_stores_pending_identity() {
        let provider = FakeProvider::default();
        let sessions = InMemorySessionStore::new(600);
        let state = encode_state("nonce", OAuthAction::Signup).unwrap();

        let action = complete_oauth(
            &provider,
            &sessions,
            "sid",
            Some(&state),
            &params(Some(&state), Some("code-1")),
        )
        .await
        .unwrap();

        assert_eq!(action, OAuthAction::Signup);
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
        let pending = sessions.get("sid").await.unwrap();
        assert_eq!(pending.email, "test@example.com");
        assert_eq!(pending.name, "testuser");
        assert_eq!(pending.dob, None);
    }

    #[tokio::test]
    async fn test_state_mismatch_fails_before_exchange() {
        let provider = FakeProvider::default();
        let sessions = InMemorySessionStore::new(600);
        let cookie = encode_state("nonce-a", OAuthAction::Login).unwrap();
        let forged = encode_state("nonce-b", OAuthAction::Login).unwrap();

        let err = complete_oauth(
            &provider,
            &sessions,
            "sid",
            Some(&cookie),
            &params(Some(&forged), Some("code-1")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AuthError::OAuthStateMismatch));
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
        assert!(sessions.get("sid").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_cookie_or_query_state() {
        let provider = FakeProvider::default();
        let sessions = InMemorySessionStore::new(600);
        let state = encode_state("nonce", OAuthAction::Login).unwrap();

        let err = complete_oauth(&provider, &sessions, "sid", None, &params(Some(&state), Some("c")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthStateMissing));

        let err = complete_oauth(&provider, &sessions, "sid", Some(&state), &params(None, Some("c")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthStateMismatch));
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_and_missing_code() {
        let provider = FakeProvider::default();
        let sessions = InMemorySessionStore::new(600);
        let state = encode_state("nonce", OAuthAction::Login).unwrap();

        let mut denied = params(Some(&state), None);
        denied.error = Some("access_denied".to_string());
        let err = complete_oauth(&provider, &sessions, "sid", Some(&state), &denied)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UpstreamProvider(_)));

        let err = complete_oauth(&provider, &sessions, "sid", Some(&state), &params(Some(&state), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UpstreamProvider(_)));
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_user_info_failure_leaves_no_session() {
        let provider = FakeProvider {
            fail_user_info: true,
            ..Default::default()
        };
        let sessions = InMemorySessionStore::new(600);
        let state = encode_state("nonce", OAuthAction::Signup).unwrap();

        let err = complete_oauth(
            &provider,
            &sessions,
            "sid",
            Some(&state),
            &params(Some(&state), Some("code")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AuthError::UpstreamProvider(_)));
        assert!(sessions.get("sid").await.is_none());
    }
}
