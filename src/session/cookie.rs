//! Cookie parsing and `Set-Cookie` construction for the session cookies.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::cli::Environment;

/// Cookie name for the session token (three-segment, refreshed every 15 minutes).
pub const SESSION_COOKIE_NAME: &str = "session";

/// Cookie name for the refresh token. Issued by the auth service, only cleared here.
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Script-readable flag telling the frontend to prompt for a password change.
pub const IS_CHANGE_PASSWORD_COOKIE_NAME: &str = "is_change_password";

/// Lifetime of a session cookie written after a refresh: 15 minutes.
pub const REFRESHED_SESSION_MAX_AGE_SECS: u64 = 15 * 60;

/// Lifetime of a session cookie written after sign-in: 24 hours.
pub const SIGNIN_SESSION_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Raw Cookie header, forwarded verbatim to the auth service.
pub fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE)?.to_str().ok()
}

/// Whether `value` can be written into a cookie verbatim (RFC 6265
/// `cookie-octet`: visible ASCII except `"`, `,`, `;` and `\`).
pub fn is_cookie_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}

/// Replace (or add) a cookie in the request's Cookie header so handlers
/// further down the stack see the new value.
pub fn replace_cookie(headers: &mut HeaderMap, name: &str, value: &str) {
    let mut pairs: Vec<String> = cookie_header(headers)
        .map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .filter(|part| {
                    part.split_once('=')
                        .is_none_or(|(key, _)| key.trim() != name)
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    pairs.push(format!("{}={}", name, value));

    if let Ok(value) = HeaderValue::from_str(&pairs.join("; ")) {
        headers.insert(header::COOKIE, value);
    }
}

/// SameSite attribute values used by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes derived from the deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    production: bool,
}

impl CookiePolicy {
    pub fn new(environment: Environment) -> Self {
        Self {
            production: environment == Environment::Production,
        }
    }

    /// Whether environment-dependent cookies carry the Secure flag.
    pub fn secure(&self) -> bool {
        self.production
    }

    /// `Set-Cookie` value for a session token obtained from the refresh endpoint.
    ///
    /// Production runs cross-site behind the portal frontend, so it needs
    /// `SameSite=None` (which browsers only accept together with `Secure`).
    pub fn refreshed_session(&self, token: &str) -> String {
        let same_site = if self.production {
            SameSite::None
        } else {
            SameSite::Strict
        };
        self.build(
            SESSION_COOKIE_NAME,
            token,
            same_site,
            REFRESHED_SESSION_MAX_AGE_SECS,
        )
    }

    /// `Set-Cookie` value for a session token obtained from OTP sign-in.
    pub fn signin_session(&self, token: &str) -> String {
        let same_site = if self.production {
            SameSite::Strict
        } else {
            SameSite::Lax
        };
        self.build(
            SESSION_COOKIE_NAME,
            token,
            same_site,
            SIGNIN_SESSION_MAX_AGE_SECS,
        )
    }

    /// `Set-Cookie` value for a session token obtained from sign-up or Google
    /// sign-in. Always `Secure` and `SameSite=Strict`, whatever the environment.
    pub fn issued_session(&self, token: &str) -> String {
        Attributes {
            http_only: true,
            same_site: SameSite::Strict,
            max_age: Some(SIGNIN_SESSION_MAX_AGE_SECS),
            secure: true,
        }
        .format(SESSION_COOKIE_NAME, token)
    }

    /// `Set-Cookie` value for the `is_change_password` flag. Readable by
    /// scripts and kept for the browser session.
    pub fn change_password_flag(&self, value: &str) -> String {
        let same_site = if self.production {
            SameSite::Strict
        } else {
            SameSite::Lax
        };
        Attributes {
            http_only: false,
            same_site,
            max_age: None,
            secure: self.production,
        }
        .format(IS_CHANGE_PASSWORD_COOKIE_NAME, value)
    }

    /// `Set-Cookie` value that deletes the named cookie.
    pub fn clear(&self, name: &str) -> String {
        self.build(name, "", SameSite::Strict, 0)
    }

    fn build(&self, name: &str, value: &str, same_site: SameSite, max_age: u64) -> String {
        Attributes {
            http_only: true,
            same_site,
            max_age: Some(max_age),
            secure: self.production,
        }
        .format(name, value)
    }
}

struct Attributes {
    http_only: bool,
    same_site: SameSite,
    max_age: Option<u64>,
    secure: bool,
}

impl Attributes {
    fn format(&self, name: &str, value: &str) -> String {
        let mut cookie = format!("{}={}", name, value);
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.same_site.as_str());
        cookie.push_str("; Path=/");
        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Append `Set-Cookie` headers to a response header map, skipping values
/// that are not valid header text.
pub fn append_set_cookies<I>(headers: &mut HeaderMap, cookies: I)
where
    I: IntoIterator<Item = String>,
{
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Refusing to write invalid cookie"),
        }
    }
}
