//! JWT issuance and verification
//!
//! Access and refresh tokens are HS256 JWTs, each signed with its own secret and
//! stamped with its kind in `typ`. Claims carry the user's email as `sub`, a fresh
//! `jti` and UTC `iat`/`exp` in seconds. A token stays valid up to and including
//! the second stored in `exp`, and only where a token of its kind is expected.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};
use super::models::{Claims, TokenKind};
use crate::common::config::TokenConfig;

/// Mints and checks the tokens handed out at login.
pub trait TokenIssuer: Send + Sync {
    fn issue_access_token(&self, subject: &str) -> AuthResult<String>;
    fn issue_refresh_token(&self, subject: &str) -> AuthResult<String>;
    fn verify_refresh_token(&self, token: &str) -> AuthResult<Claims>;
}

#[derive(Debug, Clone)]
pub struct JwtService {
    config: TokenConfig,
}

impl JwtService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    fn sign_key(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.config.access_sign_key.as_bytes(),
            TokenKind::Refresh => self.config.refresh_sign_key.as_bytes(),
        }
    }

    fn verify_key(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.config.access_verify_key.as_bytes(),
            TokenKind::Refresh => self.config.refresh_verify_key.as_bytes(),
        }
    }

    /// Build claims of `kind` for `subject`, valid for that kind's lifetime from now.
    pub fn new_claims(&self, subject: &str, kind: TokenKind) -> Claims {
        let ttl_secs = match kind {
            TokenKind::Access => self.config.access_ttl_secs,
            TokenKind::Refresh => self.config.refresh_ttl_secs,
        };
        let now = Utc::now();
        Claims {
            sub: subject.to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }

    pub fn sign(&self, claims: &Claims, sign_key: &[u8]) -> AuthResult<String> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(sign_key),
        )
        .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }

    fn issue(&self, subject: &str, kind: TokenKind) -> AuthResult<String> {
        let claims = self.new_claims(subject, kind);
        debug!(jti = %claims.jti, kind = ?kind, exp = claims.exp, "Issuing token");
        self.sign(&claims, self.sign_key(kind))
    }

    /// Check signature, issuer, audience, expiry and kind of `token`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.verify_key(expected)),
            &validation,
        )
        .map_err(|e| {
            let mapped = match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidTokenClaims,
                _ => AuthError::MalformedToken,
            };
            warn!(error = %e, "JWT token validation failed");
            mapped
        })?;

        if data.claims.typ != expected {
            warn!(expected = ?expected, found = ?data.claims.typ, "JWT token of the wrong kind");
            return Err(AuthError::InvalidTokenClaims);
        }

        Ok(data.claims)
    }
}

impl TokenIssuer for JwtService {
    fn issue_access_token(&self, subject: &str) -> AuthResult<String> {
        self.issue(subject, TokenKind::Access)
    }

    fn issue_refresh_token(&self, subject: &str) -> AuthResult<String> {
        self.issue(subject, TokenKind::Refresh)
    }

    fn verify_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
pub(crate) fn test_token_config() -> TokenConfig {
    use crate::common::config::{TOKEN_AUDIENCE, TOKEN_ISSUER};

    TokenConfig {
        access_sign_key: "access-secret".to_string(),
        access_verify_key: "access-secret".to_string(),
        refresh_sign_key: "refresh-secret".to_string(),
        refresh_verify_key: "refresh-secret".to_string(),
        access_ttl_secs: 600,
        refresh_ttl_secs: 3600,
        issuer: TOKEN_ISSUER.to_string(),
        audience: TOKEN_AUDIENCE.to_string(),
    }
}
