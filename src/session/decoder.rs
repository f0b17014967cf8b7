//! Session cookie decoding.
//!
//! The cookie has a JWT shape (`header.payload.signature`). Without a
//! configured secret only the payload's own expiry is trusted; with one, the
//! token is verified as HS256 before any claim is read.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};

use super::record::SessionRecord;
use crate::jwt::{JwtConfig, JwtError};

/// Reasons a session cookie was rejected.
#[derive(Debug)]
pub enum DecodeError {
    /// No cookie, or an empty one
    Empty,
    /// Not exactly three dot-separated segments
    Malformed { segments: usize },
    /// Payload segment is not base64
    Encoding(base64::DecodeError),
    /// Payload is not a session record
    Payload(serde_json::Error),
    /// Signature check failed (only when a secret is configured)
    Signature(JwtError),
    /// Expiry is at or before the current time
    Expired { exp: u64, now: u64 },
    /// System clock is before the Unix epoch
    TimeError,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "No session token provided"),
            DecodeError::Malformed { segments } => {
                write!(f, "Invalid token format: {} segments", segments)
            }
            DecodeError::Encoding(e) => write!(f, "Invalid payload encoding: {}", e),
            DecodeError::Payload(e) => write!(f, "Invalid payload: {}", e),
            DecodeError::Signature(e) => write!(f, "{}", e),
            DecodeError::Expired { exp, now } => {
                write!(f, "Session token expired at {} (now {})", exp, now)
            }
            DecodeError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Turns a session cookie into a [`SessionRecord`].
#[derive(Clone, Default)]
pub struct SessionDecoder {
    jwt: Option<JwtConfig>,
}

impl SessionDecoder {
    /// Decoder that trusts the payload without checking a signature.
    pub fn unverified() -> Self {
        Self { jwt: None }
    }

    /// Decoder that verifies the HS256 signature before reading claims.
    pub fn verified(jwt: JwtConfig) -> Self {
        Self { jwt: Some(jwt) }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.jwt.is_some()
    }

    /// Decode a cookie against the current time. Failures are logged and
    /// reported as `None`; callers treat them exactly like a missing cookie.
    pub fn decode(&self, cookie: Option<&str>) -> Option<SessionRecord> {
        let result = now_secs().and_then(|now| self.decode_at(cookie, now));
        match result {
            Ok(record) => Some(record),
            Err(DecodeError::Empty) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to decode session");
                None
            }
        }
    }

    /// Decode a cookie as of `now` (Unix seconds).
    pub fn decode_at(&self, cookie: Option<&str>, now: u64) -> Result<SessionRecord, DecodeError> {
        let token = cookie.filter(|c| !c.is_empty()).ok_or(DecodeError::Empty)?;

        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(DecodeError::Malformed {
                segments: segments.len(),
            });
        }

        let record = match &self.jwt {
            Some(jwt) => jwt
                .validate_session_token(token)
                .map_err(DecodeError::Signature)?,
            None => decode_payload(segments[1])?,
        };

        if !record.is_unexpired(now) {
            return Err(DecodeError::Expired {
                exp: record.exp,
                now,
            });
        }

        Ok(record)
    }
}

/// Decode the base64 JSON payload segment. Accepts both the URL-safe and the
/// standard alphabet, with or without padding.
fn decode_payload(segment: &str) -> Result<SessionRecord, DecodeError> {
    let trimmed = segment.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(DecodeError::Encoding)?;
    serde_json::from_slice(&bytes).map_err(DecodeError::Payload)
}

fn now_secs() -> Result<u64, DecodeError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| DecodeError::TimeError)
}
