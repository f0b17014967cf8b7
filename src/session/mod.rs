//! Session cookie handling.
//!
//! The `session` cookie carries a three-segment token issued by the external
//! auth service. It is decoded on every request and never stored server-side.

mod context;
mod cookie;
mod decoder;
mod record;

pub use context::{AuthUser, Session, SessionContext};
pub use cookie::{
    CookiePolicy, IS_CHANGE_PASSWORD_COOKIE_NAME, REFRESH_COOKIE_NAME,
    REFRESHED_SESSION_MAX_AGE_SECS, SESSION_COOKIE_NAME, SIGNIN_SESSION_MAX_AGE_SECS, SameSite,
    append_set_cookies, cookie_header, get_cookie, is_cookie_value, replace_cookie,
};
pub use decoder::{DecodeError, SessionDecoder};
pub use record::{SessionRecord, UserType};
