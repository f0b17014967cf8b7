//! Session record carried in the middle segment of the session cookie.

use serde::{Deserialize, Serialize};

/// Account type of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Business (B2B) account
    B2b,
    #[default]
    Guest,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::B2b => "b2b",
            UserType::Guest => "guest",
        }
    }
}

/// Identity claims decoded from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Subject. A record without one never authenticates a request.
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(rename = "roleBaseUserId", default)]
    pub role_base_user_id: String,
    #[serde(rename = "userUniqueId", default)]
    pub user_unique_id: String,
    #[serde(default)]
    pub email: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl SessionRecord {
    /// Whether the expiry lies strictly after `now`.
    pub fn is_unexpired(&self, now: u64) -> bool {
        now < self.exp
    }

    /// Whether this record may authenticate a request at `now`.
    pub fn is_valid(&self, now: u64) -> bool {
        self.is_unexpired(now) && self.subject().is_some()
    }

    /// Subject identifier, treating an empty string like a missing one.
    pub fn subject(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: Option<&str>, exp: u64) -> SessionRecord {
        SessionRecord {
            user_id: user_id.map(str::to_string),
            user_type: UserType::B2b,
            role_base_user_id: "rb-1".to_string(),
            user_unique_id: "u-1".to_string(),
            email: "agent@example.com".to_string(),
            iat: 0,
            exp,
        }
    }

    #[test]
    fn test_valid_requires_subject_and_future_expiry() {
        assert!(record(Some("42"), 100).is_valid(99));
        assert!(!record(Some("42"), 100).is_valid(100));
        assert!(!record(None, 100).is_valid(10));
        assert!(!record(Some(""), 100).is_valid(10));
    }

    #[test]
    fn test_deserialize_wire_names() {
        let json = r#"{
            "userId": "42",
            "user_type": "b2b",
            "roleBaseUserId": "rb",
            "userUniqueId": "uu",
            "email": "a@b.c",
            "iat": 1,
            "exp": 2
        }"#;
        let parsed: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.user_id.as_deref(), Some("42"));
        assert_eq!(parsed.user_type, UserType::B2b);
        assert_eq!(parsed.role_base_user_id, "rb");
        assert_eq!(parsed.user_unique_id, "uu");
        assert_eq!(parsed.exp, 2);
    }

    #[test]
    fn test_null_subject_is_accepted_by_shape() {
        let parsed: SessionRecord =
            serde_json::from_str(r#"{"userId": null, "user_type": "guest", "exp": 5}"#).unwrap();
        assert_eq!(parsed.user_id, None);
        assert_eq!(parsed.user_type, UserType::Guest);
    }

    #[test]
    fn test_unknown_user_type_rejected() {
        let parsed =
            serde_json::from_str::<SessionRecord>(r#"{"userId": "1", "user_type": "admin", "exp": 5}"#);
        assert!(parsed.is_err());
    }
}
