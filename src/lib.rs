pub mod api;
pub mod cache;
pub mod cli;
pub mod gatekeeper;
pub mod jwt;
pub mod pages;
pub mod session;
pub mod state;
pub mod upstream;

use api::create_api_router;
use axum::{Router, middleware};
use cli::Environment;
use gatekeeper::{RoutePattern, RouteTable, gatekeeper};
use jwt::JwtConfig;
use session::{CookiePolicy, SessionDecoder};
use state::PortalState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use upstream::{AuthService, UpstreamError};
use url::Url;

pub struct ServerConfig {
    /// Base URL of the external auth service
    pub api_host: Url,
    /// Development or production; drives cookie attributes
    pub environment: Environment,
    /// HMAC secret for session signatures (unchecked when absent)
    pub jwt_secret: Option<Vec<u8>>,
    /// Protected path patterns; empty means the built-in defaults
    pub protected: Vec<RoutePattern>,
    /// Timeout for auth service calls (transport default when absent)
    pub upstream_timeout: Option<Duration>,
}

/// Build the shared state for the given configuration.
pub fn create_state(config: &ServerConfig) -> Result<PortalState, UpstreamError> {
    let decoder = match &config.jwt_secret {
        Some(secret) => SessionDecoder::verified(JwtConfig::new(secret)),
        None => SessionDecoder::unverified(),
    };

    let routes = if config.protected.is_empty() {
        RouteTable::default()
    } else {
        RouteTable::new(config.protected.clone())
    };

    let auth = AuthService::new(&config.api_host, config.upstream_timeout)?;
    let cookies = CookiePolicy::new(config.environment);

    info!(
        verify_signatures = decoder.verifies_signatures(),
        secure_cookies = cookies.secure(),
        "Session policy"
    );

    Ok(PortalState {
        decoder: Arc::new(decoder),
        routes: Arc::new(routes),
        auth: Arc::new(auth),
        cookies,
    })
}

/// Create the application router with the given configuration.
///
/// Every route, API included, runs behind the gatekeeper; it decides per
/// path whether a session is required.
pub fn create_app(config: &ServerConfig) -> Result<Router, UpstreamError> {
    let state = create_state(config)?;

    Ok(Router::new()
        .nest("/api", create_api_router(state.clone()))
        .merge(pages::router())
        .layer(middleware::from_fn_with_state(state, gatekeeper)))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}
