use std::net::IpAddr;

use axum::http::HeaderValue;
use decora_gemini::GeminiConfig;

pub use decora_gemini::ConfigError;

/// Default upload cap: 15 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Default idle lifetime of a session: one hour.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Server configuration loaded from environment variables.
///
/// Everything except `GEMINI_API_KEY` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: IpAddr,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Sessions not looked up for this many seconds are evicted.
    pub session_ttl_secs: u64,
    /// Where confirmed emails are posted. `None` disables the notification.
    pub notify_webhook_url: Option<String>,
    /// Generation backend credentials and models.
    pub gemini: GeminiConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_UPLOAD_BYTES`     | `15728640`                 |
    /// | `SESSION_TTL_SECS`     | `3600`                     |
    /// | `NOTIFY_WEBHOOK_URL`   | unset                      |
    ///
    /// Backend variables are documented on [`GeminiConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gemini = GeminiConfig::from_lookup(&lookup)?;

        let host: IpAddr = parse_or(
            &lookup,
            "HOST",
            Some(IpAddr::from([0, 0, 0, 0])),
            "an IP address",
        )?;
        let port: u16 = parse_or(&lookup, "PORT", Some(3000), "a valid port number")?;
        let request_timeout_secs: u64 = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            Some(30),
            "a positive number of seconds",
        )?;
        require_positive("REQUEST_TIMEOUT_SECS", request_timeout_secs)?;
        let session_ttl_secs: u64 = parse_or(
            &lookup,
            "SESSION_TTL_SECS",
            Some(DEFAULT_SESSION_TTL_SECS),
            "a positive number of seconds",
        )?;
        require_positive("SESSION_TTL_SECS", session_ttl_secs)?;
        let max_upload_bytes: usize = parse_or(
            &lookup,
            "MAX_UPLOAD_BYTES",
            Some(DEFAULT_MAX_UPLOAD_BYTES),
            "a number of bytes",
        )?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|origin| {
                let invalid = || ConfigError::Invalid {
                    name: "CORS_ORIGINS",
                    expected: "a comma-separated list of explicit origins",
                    value: origin.clone(),
                };
                // Credentialed CORS cannot use the wildcard origin.
                if origin == "*" {
                    return Err(invalid());
                }
                origin.parse::<HeaderValue>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let notify_webhook_url = lookup("NOTIFY_WEBHOOK_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            session_ttl_secs,
            notify_webhook_url,
            gemini,
        })
    }
}

/// Parse `name` if set, else fall back to `default`.
fn parse_or<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Option<T>,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let invalid = |value: String| ConfigError::Invalid {
        name,
        expected,
        value,
    };
    match lookup(name).map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw.parse().map_err(|_| invalid(raw)),
        _ => default.ok_or_else(|| invalid(String::new())),
    }
}

fn require_positive(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            expected: "a positive number of seconds",
            value: value.to_string(),
        });
    }
    Ok(())
}
