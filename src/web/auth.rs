//! Session token verification.
//!
//! Identity is managed by an external auth provider; the API only verifies
//! the RS256 session JWTs it issues. The provider's user ids are opaque
//! strings and are stored as-is on profiles, enrollments and payments.

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingToken,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error("Token verification failed: {0}")]
    VerificationFailed(#[from] jsonwebtoken::errors::Error),

    #[error("Auth is enabled but no JWT public key is configured")]
    MissingKey,
}

/// Claims carried by the provider's session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider user id
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub email: Option<String>,
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Verifies session JWTs against the provider's public key.
///
/// Construction never fails so the router can be built before secrets are
/// available; a missing key only errors when a token actually needs
/// verifying.
pub struct JwtVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtVerifier {
    pub fn from_config(config: &AuthConfig) -> Self {
        let key = if config.jwt_public_key.is_empty() {
            None
        } else {
            DecodingKey::from_rsa_pem(config.jwt_public_key.as_bytes()).ok()
        };

        let mut validation = Validation::new(Algorithm::RS256);
        if !config.jwt_issuer.is_empty() {
            validation.set_issuer(&[&config.jwt_issuer]);
        }
        if !config.jwt_audience.is_empty() {
            validation.set_audience(&[&config.jwt_audience]);
        } else {
            validation.validate_aud = false;
        }

        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let key = self.key.as_ref().ok_or(AuthError::MissingKey)?;
        let data = decode::<SessionClaims>(token, key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Pull the bearer token out of the `Authorization` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}
