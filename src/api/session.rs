//! Read-only views of the current session.

use axum::{Json, Router, extract::State, routing::get};
use tracing::warn;

use crate::session::{Session, SessionContext};
use crate::state::PortalState;
use crate::upstream::Permissions;

pub fn router(state: PortalState) -> Router {
    Router::new()
        .route("/session", get(get_session))
        .route("/permissions", get(get_permissions))
        .with_state(state)
}

async fn get_session(Session(session): Session) -> Json<SessionContext> {
    Json(session)
}

/// Permissions of the signed-in user. Anonymous requests and auth service
/// failures both yield empty lists.
async fn get_permissions(
    State(state): State<PortalState>,
    Session(session): Session,
) -> Json<Permissions> {
    if !session.is_authenticated || session.token.is_empty() {
        return Json(Permissions::default());
    }

    match state.auth.permissions(&session.token).await {
        Ok(permissions) => Json(permissions),
        Err(e) => {
            warn!(error = %e, "Failed to fetch permissions");
            Json(Permissions::default())
        }
    }
}
