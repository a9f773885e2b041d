//! Server configuration and environment helpers.
//!
//! All configuration is driven by environment variables. Component crates
//! (negotiation, hawk) own their option structs and read them through the
//! helpers defined here so every crate parses booleans and numbers the same way.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Global configuration for an apiguard server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Bind address for the HTTP listener.
    pub listen: String,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Render errors as negotiated `{"code", "message"}` payloads instead of plain text.
    pub structured_errors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            structured_errors: true,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen: env_string("GATEWAY_LISTEN", &defaults.listen),
            log_level: env_string("LOG_LEVEL", &defaults.log_level),
            structured_errors: env_bool("STRUCTURED_ERRORS", defaults.structured_errors),
        }
    }
}

/// Read a string variable, falling back to `default` when unset.
#[must_use]
pub fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read a boolean variable (`1`, `true`, `yes`, case-insensitive).
#[must_use]
pub fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| parse_bool(&v))
}

/// Read and parse a variable, falling back to `default` when unset or invalid.
///
/// An unparseable value is logged and ignored rather than aborting start-up.
#[must_use]
pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable environment variable");
            default
        }),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}
