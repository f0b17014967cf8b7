mod auth;
mod error;
mod session;

use axum::Router;

use crate::state::PortalState;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(state: PortalState) -> Router {
    Router::new()
        .nest("/auth", auth::router(state.clone()))
        .merge(session::router(state))
}
