//! Sign-in, sign-up, password change and sign-out.
//!
//! The credential endpoints forward the submitted form to the auth service
//! and, on success, store the issued token in the session cookie. Sign-out
//! only drops the cookie; the refresh token is left to expire on the auth
//! service.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tracing::info;

use super::error::{ApiError, ResultExt};
use crate::session::{
    IS_CHANGE_PASSWORD_COOKIE_NAME, SESSION_COOKIE_NAME, Session, SessionContext,
    append_set_cookies,
};
use crate::state::PortalState;
use crate::upstream::{
    AuthResponse, ChangePasswordRequest, GoogleSignInRequest, SigninRequest, SignupRequest,
};

pub fn router(state: PortalState) -> Router {
    Router::new()
        .route("/signin", post(signin))
        .route("/signup", post(signup))
        .route("/google", post(google_sign_in))
        .route("/change-password", post(change_password))
        .route("/signout", post(signout))
        .with_state(state)
}

#[derive(Serialize)]
struct SignedInResponse {
    success: bool,
    data: Option<serde_json::Value>,
    session: SessionContext,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
    data: Option<serde_json::Value>,
}

/// Turn a successful envelope into a response carrying the session cookie
/// built by `cookie`.
fn signed_in(
    state: &PortalState,
    result: &AuthResponse,
    token: &str,
    cookie: String,
    method: &'static str,
) -> Response {
    let session = state
        .decoder
        .decode(Some(token))
        .map(|record| SessionContext::from_record(token, &record))
        .unwrap_or_default();
    if let Some(email) = session.email() {
        info!(email, method, "User signed in");
    }

    let mut response = Json(SignedInResponse {
        success: true,
        data: result.data.clone(),
        session,
    })
    .into_response();
    append_set_cookies(response.headers_mut(), [cookie]);
    response
}

async fn signin(
    State(state): State<PortalState>,
    Json(request): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .auth
        .login(&request)
        .await
        .upstream_err("Login request failed")?;

    if !result.success {
        return Err(ApiError::unauthorized(
            result.message.unwrap_or_else(|| "Login failed".into()),
        ));
    }

    let token = result
        .access_token()
        .ok_or_else(|| ApiError::upstream_error("Login response", "missing accessToken"))?;

    let mut response = signed_in(
        &state,
        &result,
        token,
        state.cookies.signin_session(token),
        "otp",
    );
    if let Some(flag) = result.is_change_password() {
        append_set_cookies(
            response.headers_mut(),
            [state.cookies.change_password_flag(&flag)],
        );
    }
    Ok(response)
}

async fn google_sign_in(
    State(state): State<PortalState>,
    Json(request): Json<GoogleSignInRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .auth
        .google_sign_in(&request)
        .await
        .upstream_err("Google sign-in request failed")?;

    if !result.success {
        return Err(ApiError::unauthorized(
            result.message.unwrap_or_else(|| "Login failed".into()),
        ));
    }

    let token = result
        .token()
        .ok_or_else(|| ApiError::upstream_error("Google sign-in response", "missing token"))?;

    Ok(signed_in(
        &state,
        &result,
        token,
        state.cookies.issued_session(token),
        "google",
    ))
}

async fn signup(
    State(state): State<PortalState>,
    Json(request): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .auth
        .signup(&request)
        .await
        .upstream_err("Signup request failed")?;

    if !result.success {
        return Err(ApiError::bad_request(
            result.message.unwrap_or_else(|| "Signup failed".into()),
        ));
    }

    let token = result
        .token()
        .ok_or_else(|| ApiError::upstream_error("Signup response", "missing token"))?;

    Ok(signed_in(
        &state,
        &result,
        token,
        state.cookies.issued_session(token),
        "signup",
    ))
}

/// Forward a password change with the current session as bearer. Once the
/// auth service has answered, the `is_change_password` prompt is cleared
/// whatever the outcome.
async fn change_password(
    State(state): State<PortalState>,
    Session(session): Session,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    if !session.is_authenticated {
        return Err(ApiError::unauthorized("Not signed in"));
    }
    if !request.is_confirmed() {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    let result = state
        .auth
        .change_password(&session.token, &request)
        .await
        .upstream_err("Password change request failed")?;

    let mut response = if result.success {
        Json(SuccessResponse {
            success: true,
            data: result.data,
        })
        .into_response()
    } else {
        ApiError::bad_request(
            result
                .message
                .unwrap_or_else(|| "Password Change failed".into()),
        )
        .into_response()
    };
    append_set_cookies(
        response.headers_mut(),
        [state.cookies.clear(IS_CHANGE_PASSWORD_COOKIE_NAME)],
    );
    Ok(response)
}

async fn signout(State(state): State<PortalState>, Session(mut session): Session) -> Response {
    session.logout();
    let mut response = Json(session).into_response();
    append_set_cookies(
        response.headers_mut(),
        [state.cookies.clear(SESSION_COOKIE_NAME)],
    );
    response
}
