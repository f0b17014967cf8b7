//! Per-request authorization for portal routes.
//!
//! Every request ends in exactly one of: pass through, redirect home (signed-in
//! user on a sign-in page), pass through with a refreshed session cookie, or a
//! forced logout that redirects to sign-in. Nothing is kept between requests;
//! concurrent requests from one browser each run their own refresh.

mod routes;

pub use routes::{
    AUTH_PREFIX, DEFAULT_PROTECTED_PATTERNS, RouteClass, RoutePattern, RouteTable, is_auth_route,
};

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info, warn};

use crate::session::{
    REFRESH_COOKIE_NAME, SESSION_COOKIE_NAME, SessionContext, append_set_cookies, cookie_header,
    get_cookie, replace_cookie,
};
use crate::state::PortalState;
use crate::upstream::UpstreamError;

/// Where signed-in users are sent when they open a sign-in page.
pub const HOME_PATH: &str = "/";

/// Sign-in page used for forced logouts.
pub const SIGNIN_PATH: &str = "/auth/signin";

/// Decision for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Forward the request unchanged, with its session attached
    Continue(SessionContext),
    /// Forward the request carrying a session token fresh from the auth service
    Refreshed {
        token: String,
        context: SessionContext,
    },
    /// Signed-in user on an auth route
    RedirectHome,
    /// Session could not be restored; cookies are cleared
    SignIn { redirect_to: String },
}

/// Sign-in URL that returns the user to `path` afterwards.
pub fn signin_redirect(path: &str) -> String {
    format!("{}?redirect={}", SIGNIN_PATH, path)
}

/// Decide what happens to a request for `path` with the given headers.
///
/// The only side effects are the outbound refresh call and, when it fails,
/// the best-effort logout call.
pub async fn decide(state: &PortalState, path: &str, headers: &HeaderMap) -> Outcome {
    let class = state.routes.classify(path);
    let token = get_cookie(headers, SESSION_COOKIE_NAME);
    let record = state
        .decoder
        .decode(token)
        .filter(|record| record.subject().is_some());

    match (record, class) {
        (Some(_), RouteClass::Auth) => {
            debug!(path, "Signed-in user on auth route");
            Outcome::RedirectHome
        }
        (Some(record), _) => Outcome::Continue(SessionContext::from_record(
            token.unwrap_or_default(),
            &record,
        )),
        (None, RouteClass::Protected) => refresh_or_logout(state, path, headers).await,
        (None, RouteClass::Auth | RouteClass::Public) => {
            Outcome::Continue(SessionContext::anonymous())
        }
    }
}

async fn refresh_or_logout(state: &PortalState, path: &str, headers: &HeaderMap) -> Outcome {
    let cookies = cookie_header(headers);

    match state.auth.refresh_token(cookies).await {
        Ok(token) => {
            info!(path, "Session refreshed");
            let context = state
                .decoder
                .decode(Some(&token))
                .map(|record| SessionContext::from_record(&token, &record))
                .unwrap_or_default();
            Outcome::Refreshed { token, context }
        }
        Err(e) => {
            match &e {
                UpstreamError::Unauthorized => info!(path, "Refresh token rejected, logging out"),
                _ => warn!(path, error = %e, "Session refresh failed, logging out"),
            }
            logout(state, cookies).await;
            Outcome::SignIn {
                redirect_to: signin_redirect(path),
            }
        }
    }
}

/// Best-effort remote logout. Local logout proceeds regardless.
async fn logout(state: &PortalState, cookies: Option<&str>) {
    if let Err(e) = state.auth.logout(cookies).await {
        warn!(error = %e, "Logout request failed");
    }
}

/// Middleware guarding every portal route.
pub async fn gatekeeper(
    State(state): State<PortalState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match decide(&state, &path, request.headers()).await {
        Outcome::Continue(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Outcome::Refreshed { token, context } => {
            replace_cookie(request.headers_mut(), SESSION_COOKIE_NAME, &token);
            request.extensions_mut().insert(context);

            let mut response = next.run(request).await;
            append_set_cookies(
                response.headers_mut(),
                [state.cookies.refreshed_session(&token)],
            );
            response
        }
        Outcome::RedirectHome => Redirect::temporary(HOME_PATH).into_response(),
        Outcome::SignIn { redirect_to } => {
            let mut response = Redirect::temporary(&redirect_to).into_response();
            append_set_cookies(
                response.headers_mut(),
                [
                    state.cookies.clear(SESSION_COOKIE_NAME),
                    state.cookies.clear(REFRESH_COOKIE_NAME),
                ],
            );
            response
        }
    }
}
