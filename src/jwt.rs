//! HS256 verification for session tokens.
//!
//! The auth service issues the session cookie; this side never signs tokens,
//! it only checks them when a shared secret is configured.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::session::SessionRecord;

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    decoding_key: DecodingKey,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Verify the signature and expiry of a session token and decode its claims.
    pub fn validate_session_token(&self, token: &str) -> Result<SessionRecord, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<SessionRecord>(token, &self.decoding_key, &validation)
            .map_err(JwtError::Decoding)?;

        Ok(token_data.claims)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Bad signature, wrong algorithm, expired, or malformed claims
    Decoding(jsonwebtoken::errors::Error),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Decoding(e) => write!(f, "Failed to verify token: {}", e),
        }
    }
}

impl std::error::Error for JwtError {}
