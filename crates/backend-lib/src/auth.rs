// ============================
// crates/backend-lib/src/auth.rs
// ============================
//! Bearer-token verification.
//!
//! Tokens are compact HS256 JWTs signed with a single symmetric secret
//! configured at startup. The coordinator only ever calls [`TokenVerifier::verify`];
//! issuing lives here too because the external login surface and the tests
//! need it, and both sides must agree on the claim set.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// What kind of principal a token was issued to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Doctor,
}

/// Claims carried by issued bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Principal id.
    pub sub: Uuid,
    pub email: String,
    pub kind: PrincipalKind,
    pub exp: usize,
    pub iat: usize,
}

/// Verifies (and, for the login surface, issues) bearer tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenVerifier {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issue a token for a principal, valid for the configured TTL.
    pub fn issue(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        email: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now().timestamp() as usize;
        let claims = AccessClaims {
            sub: id,
            email: email.to_string(),
            kind,
            exp: now + self.ttl_secs as usize,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verify a bearer string, returning the claims on success.
    pub fn verify(&self, bearer: &str) -> Result<AccessClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AccessClaims>(bearer, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthenticated("token expired".to_string())
                }
                _ => AppError::Unauthenticated("invalid token".to_string()),
            })
    }
}

/// Strip an optional `Bearer ` prefix from an Authorization header value.
pub fn strip_bearer(value: &str) -> &str {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim()
}
