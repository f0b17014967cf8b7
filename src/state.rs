//! Shared, read-only state handed to the gatekeeper and the handlers.

use std::sync::Arc;

use crate::gatekeeper::RouteTable;
use crate::session::{CookiePolicy, SessionDecoder};
use crate::upstream::AuthService;

#[derive(Clone)]
pub struct PortalState {
    pub decoder: Arc<SessionDecoder>,
    pub routes: Arc<RouteTable>,
    pub auth: Arc<AuthService>,
    pub cookies: CookiePolicy,
}
