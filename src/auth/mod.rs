/// Bearer token verification
///
/// Upload callers present an HMAC-signed (HS256/384/512) JWT minted elsewhere. The verifier owns the
/// shared secret it was constructed with and never consults the environment itself.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an upload token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    /// Issued-at, seconds since the epoch; issuers may send fractional seconds
    pub iat: f64,
}

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub org_id: Option<String>,
    pub issued_at: f64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token has no user_id")]
    MissingUserId,
}

/// Verifies upload tokens against a process-wide shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // `exp` is enforced when present; tokens without one stay valid.
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, then decode the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }

    /// Resolve the caller from an `Authorization: Bearer <token>` header
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let claims = self.verify(token)?;

        let user_id = claims
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingUserId)?;

        Ok(AuthenticatedUser {
            user_id,
            org_id: claims.org_id,
            issued_at: claims.iat,
        })
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
