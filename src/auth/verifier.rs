use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::{Claims, Identity};
use crate::config::SecurityConfig;

/// Why a request failed authentication. All variants map to 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided. Please authenticate.")]
    MissingCredential,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        401
    }
}

/// Validates bearer credentials against the process-wide signing secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(security: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify the raw `Authorization` header value and return the caller.
    pub fn verify(&self, raw_header: Option<&str>) -> Result<Identity, AuthError> {
        let token = extract_bearer_token(raw_header).ok_or(AuthError::MissingCredential)?;

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })?;

        Ok(Identity::from(token_data.claims))
    }
}

/// Pull `<token>` out of `Bearer <token>`. Anything else counts as no credential.
fn extract_bearer_token(raw_header: Option<&str>) -> Option<&str> {
    raw_header?
        .strip_prefix("Bearer ")?
        .split(' ')
        .next()
        .filter(|token| !token.is_empty())
}
