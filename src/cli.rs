//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use crate::ServerConfig;
use crate::gatekeeper::RoutePattern;
use clap::Parser;
use tracing::{error, info, warn};
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Deployment environment. Controls cookie security attributes.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "SkyPortal",
    about = "Session gatekeeper for the SkyPortal B2B travel portal"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Base URL of the auth service (refresh, logout, login, permissions)
    #[arg(long, env = "API_HOST", default_value = "http://localhost:3001")]
    pub api_host: String,

    /// Deployment environment; production sets Secure on all session cookies
    #[arg(short, long, env = "PORTAL_ENV", value_enum, default_value = "development")]
    pub environment: Environment,

    /// Path to file containing the session signing secret. Prefer the
    /// JWT_SECRET env var. Without either, session signatures are not checked
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Protected path patterns, comma separated (e.g. "/profile,/users/:path*")
    #[arg(long = "protected", env = "PROTECTED_PATHS", value_delimiter = ',',
        value_parser = validate_route_pattern)]
    pub protected: Vec<RoutePattern>,

    /// Timeout for auth service calls in seconds (transport default if unset)
    #[arg(long)]
    pub upstream_timeout_secs: Option<u64>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_route_pattern(s: &str) -> Result<RoutePattern, String> {
    RoutePattern::parse(s.trim())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Outcome of loading the session signing secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtSecret {
    /// Session tokens must carry a valid HS256 signature
    Configured(String),
    /// Session tokens are trusted without a signature check
    Disabled,
}

impl JwtSecret {
    fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            JwtSecret::Configured(secret) => Some(secret.into_bytes()),
            JwtSecret::Disabled => None,
        }
    }
}

/// Load the session signing secret from the environment or a file.
/// Returns None and logs an error if the configured secret is unusable.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<JwtSecret> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        warn!("No JWT secret configured; session tokens are trusted without signature checks");
        return Some(JwtSecret::Disabled);
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(JwtSecret::Configured(secret))
}

/// Parse and validate the auth service URL.
/// Returns None and logs an error if validation fails.
pub fn validate_api_host(api_host: &str) -> Option<Url> {
    let url = match Url::parse(api_host) {
        Ok(url) => url,
        Err(e) => {
            error!(api_host = %api_host, error = %e, "Invalid api-host URL");
            return None;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        error!(api_host = %api_host, "api-host must be an http or https URL");
        return None;
    }

    if url.host_str().is_none() {
        error!(api_host = %api_host, "api-host has no host");
        return None;
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    api_host: Url,
    environment: Environment,
    jwt_secret: JwtSecret,
    protected: Vec<RoutePattern>,
    upstream_timeout_secs: Option<u64>,
) -> ServerConfig {
    if environment == Environment::Production && api_host.scheme() != "https" {
        warn!(api_host = %api_host, "Production deployment talks to the auth service over plain HTTP");
    }
    if protected.is_empty() {
        info!("Using default protected paths");
    }

    ServerConfig {
        api_host,
        environment,
        jwt_secret: jwt_secret.into_bytes(),
        protected,
        upstream_timeout: upstream_timeout_secs.map(Duration::from_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_host() {
        assert!(validate_api_host("http://localhost:3001").is_some());
        assert!(validate_api_host("https://api.example.com/v1").is_some());
        assert!(validate_api_host("ftp://api.example.com").is_none());
        assert!(validate_api_host("not a url").is_none());
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "skyportal",
            "--api-host",
            "https://auth.example.com",
            "--environment",
            "production",
            "--protected",
            "/profile,/users/:path*",
        ])
        .unwrap();

        assert_eq!(args.environment, Environment::Production);
        assert_eq!(args.protected.len(), 2);
        assert!(args.protected[1].matches("/users/3"));
    }

    #[test]
    fn test_rejects_bad_pattern() {
        assert!(Args::try_parse_from(["skyportal", "--protected", "profile"]).is_err());
    }

    #[test]
    fn test_load_jwt_secret_from_file() {
        let dir = std::env::temp_dir().join(format!("skyportal-secret-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let long = dir.join("long");
        let short = dir.join("short");
        std::fs::write(&long, format!("{}\n", "s".repeat(40))).unwrap();
        std::fs::write(&short, "tiny").unwrap();

        if std::env::var("JWT_SECRET").is_err() {
            assert_eq!(
                load_jwt_secret(long.to_str()),
                Some(JwtSecret::Configured("s".repeat(40)))
            );
            assert_eq!(load_jwt_secret(short.to_str()), None);
            assert_eq!(load_jwt_secret(dir.join("missing").to_str()), None);
            assert_eq!(load_jwt_secret(None), Some(JwtSecret::Disabled));
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_disabled_secret_leaves_config_unsigned() {
        let config = build_config(
            Url::parse("http://localhost:3001").unwrap(),
            Environment::Development,
            JwtSecret::Disabled,
            Vec::new(),
            None,
        );
        assert!(config.jwt_secret.is_none());
        assert!(config.upstream_timeout.is_none());
    }

    #[test]
    fn test_build_config() {
        let config = build_config(
            Url::parse("http://localhost:3001").unwrap(),
            Environment::Development,
            JwtSecret::Configured("x".repeat(32)),
            Vec::new(),
            Some(5),
        );
        assert_eq!(config.jwt_secret.as_deref().map(<[u8]>::len), Some(32));
        assert_eq!(config.upstream_timeout, Some(Duration::from_secs(5)));
    }
}
