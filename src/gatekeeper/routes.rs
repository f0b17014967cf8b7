//! Route classification for the gatekeeper.
//!
//! Protected paths use the matcher syntax of the portal's routing config:
//! `/profile` matches exactly, `/users/:path*` matches `/users` and anything
//! below it, `/users/:path+` requires at least one more segment.

/// Prefix of the sign-in/sign-up family.
pub const AUTH_PREFIX: &str = "/auth";

/// Protected path patterns used when none are configured.
pub const DEFAULT_PROTECTED_PATTERNS: &[&str] = &[
    "/dashboard",
    "/dashboard/:path*",
    "/flight/:path*",
    "/profile",
    "/users/:path*",
    "/reports/:path*",
];

/// How the gatekeeper treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Sign-in/sign-up pages, reachable without a session
    Auth,
    /// Requires a valid (or refreshable) session
    Protected,
    /// Not guarded
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Exact,
    ZeroOrMore,
    OneOrMore,
}

/// A single protected-path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    base: String,
    matcher: Matcher,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if !pattern.starts_with('/') {
            return Err(format!("Pattern must start with '/': {}", pattern));
        }
        if pattern.chars().any(|c| !c.is_ascii() || c.is_whitespace()) {
            return Err(format!("Pattern contains invalid characters: {}", pattern));
        }

        let (base, matcher) = match pattern.rsplit_once('/') {
            Some((base, last)) if last.starts_with(':') && last.ends_with('*') => {
                (base, Matcher::ZeroOrMore)
            }
            Some((base, last)) if last.starts_with(':') && last.ends_with('+') => {
                (base, Matcher::OneOrMore)
            }
            _ => (pattern, Matcher::Exact),
        };

        if base.split('/').any(|segment| segment.starts_with(':')) {
            return Err(format!(
                "Only a trailing :name* or :name+ segment is supported: {}",
                pattern
            ));
        }

        Ok(Self {
            base: normalize(base).to_string(),
            matcher,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self.matcher {
            Matcher::Exact => path == self.base,
            Matcher::ZeroOrMore => path == self.base || self.is_below(path),
            Matcher::OneOrMore => self.is_below(path),
        }
    }

    fn is_below(&self, path: &str) -> bool {
        let base = if self.base == "/" { "" } else { &self.base };
        path.strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|rest| !rest.is_empty())
    }
}

/// Strip one trailing slash, keeping the root as `/`.
fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Static set of protected patterns plus the auth-route rule.
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected: Vec<RoutePattern>,
}

impl RouteTable {
    pub fn new(protected: Vec<RoutePattern>) -> Self {
        Self { protected }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if is_auth_route(path) {
            RouteClass::Auth
        } else if self.protected.iter().any(|p| p.matches(path)) {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROTECTED_PATTERNS
                .iter()
                .filter_map(|p| RoutePattern::parse(p).ok())
                .collect(),
        )
    }
}

/// `/auth` itself or anything under `/auth/`.
pub fn is_auth_route(path: &str) -> bool {
    path.strip_prefix(AUTH_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
