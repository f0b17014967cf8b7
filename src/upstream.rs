//! HTTP client for the external auth service.
//!
//! Calls forward the browser's credentials: either the raw Cookie header
//! (refresh, logout) or the session token as a bearer (permissions, password
//! change). Sign-in and sign-up calls carry only the submitted form.

use std::time::Duration;

use axum::http::{StatusCode, header};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::session::is_cookie_value;

/// Errors from calls to the auth service.
#[derive(Debug)]
pub enum UpstreamError {
    /// The service answered 401
    Unauthorized,
    /// Any other non-2xx status
    Status(u16),
    /// Network, DNS, TLS or timeout failure
    Request(reqwest::Error),
    /// 2xx response whose body was not what we expected
    MalformedBody(String),
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamError::Unauthorized => write!(f, "Auth service rejected the credentials"),
            UpstreamError::Status(status) => write!(f, "Auth service returned HTTP {}", status),
            UpstreamError::Request(e) => write!(f, "Auth service request failed: {}", e),
            UpstreamError::MalformedBody(msg) => write!(f, "Malformed auth service response: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Request(e)
    }
}

/// Body of a successful `POST /auth/refresh-token`.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Credentials posted to `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    pub token_id: String,
    pub otp: String,
}

/// Registration form posted to `/auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Authorization code posted to `/auth/google`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSignInRequest {
    pub code: String,
}

/// Password change posted to `/auth/change-password`. The confirmation field
/// of the form is checked locally and never forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: Option<String>,
}

impl ChangePasswordRequest {
    pub fn is_confirmed(&self) -> bool {
        self.confirm_password
            .as_deref()
            .is_none_or(|confirm| confirm == self.new_password)
    }
}

/// `{success, message, data}` envelope returned by the auth endpoints.
/// A rejected call is still a 2xx with `success: false` on most of them.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl AuthResponse {
    /// Session token issued by OTP sign-in (`data.accessToken`).
    pub fn access_token(&self) -> Option<&str> {
        self.token_at("accessToken")
    }

    /// Session token issued by sign-up and Google sign-in (`data.token`).
    pub fn token(&self) -> Option<&str> {
        self.token_at("token")
    }

    /// `data.userData.is_change_password` rendered as a cookie value.
    pub fn is_change_password(&self) -> Option<String> {
        let value = self
            .data
            .as_ref()?
            .get("userData")?
            .get("is_change_password")?;
        match value {
            serde_json::Value::Bool(flag) => Some(flag.to_string()),
            serde_json::Value::String(flag) if is_cookie_value(flag) => Some(flag.clone()),
            _ => None,
        }
    }

    /// Tokens that could not be stored verbatim in a cookie count as absent.
    fn token_at(&self, field: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .get(field)?
            .as_str()
            .filter(|t| !t.is_empty() && is_cookie_value(t))
    }
}

/// Permission lists for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default)]
    pub all_permission: Vec<String>,
    #[serde(default)]
    pub all_modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionsEnvelope {
    data: Option<Permissions>,
}

/// Client for a single auth service deployment.
pub struct AuthService {
    client: reqwest::Client,
    api_host: String,
}

impl AuthService {
    /// Create a client for the service at `api_host`. Without a timeout the
    /// transport default applies.
    pub fn new(api_host: &Url, timeout: Option<Duration>) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_host: api_host.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Exchange the refresh-token cookie for a new session token.
    ///
    /// Sends `POST /auth/refresh-token` with the browser's cookies.
    pub async fn refresh_token(&self, cookies: Option<&str>) -> Result<String, UpstreamError> {
        let response = self
            .with_cookies(self.client.post(self.url("/auth/refresh-token")), cookies)
            .send()
            .await?;

        let response = Self::ensure_success(response)?;
        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedBody(e.to_string()))?;

        if body.access_token.is_empty() {
            return Err(UpstreamError::MalformedBody("empty accessToken".into()));
        }
        if !is_cookie_value(&body.access_token) {
            return Err(UpstreamError::MalformedBody(
                "accessToken is not a valid cookie value".into(),
            ));
        }
        Ok(body.access_token)
    }

    /// Tell the auth service to revoke the refresh token. The response body
    /// is ignored.
    pub async fn logout(&self, cookies: Option<&str>) -> Result<(), UpstreamError> {
        let response = self
            .with_cookies(self.client.post(self.url("/auth/logout")), cookies)
            .send()
            .await?;

        Self::ensure_success(response).map(|_| ())
    }

    /// Submit sign-in credentials. A rejected login is a successful call with
    /// `success: false`, so only transport failures and unparseable bodies
    /// are errors here.
    pub async fn login(&self, request: &SigninRequest) -> Result<AuthResponse, UpstreamError> {
        self.post_form("/auth/login", request, None).await
    }

    /// Register a new account. Same envelope rules as [`AuthService::login`].
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, UpstreamError> {
        self.post_form("/auth/signup", request, None).await
    }

    /// Exchange a Google authorization code for a session token.
    pub async fn google_sign_in(
        &self,
        request: &GoogleSignInRequest,
    ) -> Result<AuthResponse, UpstreamError> {
        self.post_form("/auth/google", request, None).await
    }

    /// Change the password of the account behind `token`.
    pub async fn change_password(
        &self,
        token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<AuthResponse, UpstreamError> {
        self.post_form("/auth/change-password", request, Some(token))
            .await
    }

    /// POST a JSON form and read the envelope whatever the status.
    async fn post_form<T: Serialize>(
        &self,
        path: &str,
        form: &T,
        bearer: Option<&str>,
    ) -> Result<AuthResponse, UpstreamError> {
        let mut request = self.client.post(self.url(path)).json(form);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedBody(e.to_string()))
    }

    /// Fetch the permissions attached to a session token.
    pub async fn permissions(&self, token: &str) -> Result<Permissions, UpstreamError> {
        let response = self
            .client
            .get(self.url("/user-permission/my-permission"))
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::ensure_success(response)?;
        let envelope: PermissionsEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedBody(e.to_string()))?;
        Ok(envelope.data.unwrap_or_default())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_host, path)
    }

    fn with_cookies(
        &self,
        request: reqwest::RequestBuilder,
        cookies: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match cookies {
            Some(cookies) => request.header(header::COOKIE, cookies),
            None => request,
        }
    }

    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::Unauthorized);
        }
        Err(UpstreamError::Status(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let service =
            AuthService::new(&Url::parse("http://auth.local:3001/").unwrap(), None).unwrap();
        assert_eq!(service.api_host, "http://auth.local:3001");
        assert_eq!(
            service.url("/auth/refresh-token"),
            "http://auth.local:3001/auth/refresh-token"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let service =
            AuthService::new(&Url::parse("https://api.example.com/v1").unwrap(), None).unwrap();
        assert_eq!(service.url("/auth/logout"), "https://api.example.com/v1/auth/logout");
    }

    #[test]
    fn test_login_access_token() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"success": true, "data": {"accessToken": "a.b.c", "userData": {}}}"#,
        )
        .unwrap();
        assert_eq!(response.access_token(), Some("a.b.c"));

        let rejected: AuthResponse =
            serde_json::from_str(r#"{"success": false, "message": "Bad OTP"}"#).unwrap();
        assert_eq!(rejected.access_token(), None);
        assert_eq!(rejected.message.as_deref(), Some("Bad OTP"));
    }

    #[test]
    fn test_token_with_cookie_delimiters_is_absent() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"success": true, "data": {"accessToken": "abc; Domain=evil.example", "token": "t.u.v"}}"#,
        )
        .unwrap();
        assert_eq!(response.access_token(), None);
        assert_eq!(response.token(), Some("t.u.v"));
    }

    #[test]
    fn test_is_change_password_flag() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"success": true, "data": {"userData": {"is_change_password": true}}}"#,
        )
        .unwrap();
        assert_eq!(response.is_change_password().as_deref(), Some("true"));

        let missing: AuthResponse =
            serde_json::from_str(r#"{"success": true, "data": {"userData": {}}}"#).unwrap();
        assert_eq!(missing.is_change_password(), None);
    }

    #[test]
    fn test_change_password_form() {
        let form: ChangePasswordRequest = serde_json::from_str(
            r#"{"oldPassword": "old", "newPassword": "new", "confirmPassword": "new"}"#,
        )
        .unwrap();
        assert!(form.is_confirmed());
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            serde_json::json!({"oldPassword": "old", "newPassword": "new"})
        );

        let mismatch = ChangePasswordRequest {
            confirm_password: Some("other".into()),
            ..form
        };
        assert!(!mismatch.is_confirmed());
    }

    #[test]
    fn test_permissions_defaults() {
        let envelope: PermissionsEnvelope =
            serde_json::from_str(r#"{"data": {"allPermission": ["booking.read"]}}"#).unwrap();
        let permissions = envelope.data.unwrap();
        assert_eq!(permissions.all_permission, vec!["booking.read"]);
        assert!(permissions.all_modules.is_empty());
    }
}
