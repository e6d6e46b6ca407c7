pub mod verifier;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use verifier::{AuthError, TokenVerifier};

/// Token payload. `id` is the subject the token was issued for.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Claims valid from now for `expiry_hours`. Lifetimes too large to
    /// represent as a timestamp are rejected.
    pub fn new(id: Uuid, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(JwtError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

/// The verified caller. Carries nothing but the subject id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(Uuid);

impl Identity {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self(claims.id)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Token lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),
}

/// Sign a token for `user_id` using the configured secret and expiry.
pub fn generate_jwt(security: &SecurityConfig, user_id: Uuid) -> Result<String, JwtError> {
    sign_claims(security, &Claims::new(user_id, security.jwt_expiry_hours)?)
}

pub fn sign_claims(security: &SecurityConfig, claims: &Claims) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}
