//! The session value handed to handlers.
//!
//! The gatekeeper stores one [`SessionContext`] in the request extensions;
//! handlers receive it through the [`Session`] extractor instead of reading
//! any shared auth state.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

use super::record::SessionRecord;

/// Signed-in user as exposed to the portal frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_verified: bool,
}

impl AuthUser {
    /// Build the user from a record with a subject. The email doubles as the
    /// display name since the token carries no name claim.
    pub fn from_record(record: &SessionRecord) -> Option<Self> {
        let id = record.subject()?;
        Some(Self {
            id: id.to_string(),
            email: record.email.clone(),
            name: record.email.clone(),
            role: record.user_type.as_str().to_string(),
            is_verified: true,
        })
    }
}

/// Per-request session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub token: String,
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a decoded record. Records without a subject stay anonymous.
    pub fn from_record(token: &str, record: &SessionRecord) -> Self {
        let mut context = Self::anonymous();
        if let Some(user) = AuthUser::from_record(record) {
            context.login(token, user);
        }
        context
    }

    pub fn login(&mut self, token: &str, user: AuthUser) {
        self.token = token.to_string();
        self.user = Some(user);
        self.is_authenticated = true;
    }

    pub fn logout(&mut self) {
        *self = Self::anonymous();
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }
}

/// Extractor for the request's session. Never fails; requests the gatekeeper
/// did not see are anonymous.
pub struct Session(pub SessionContext);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Session(
            parts
                .extensions
                .get::<SessionContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}
