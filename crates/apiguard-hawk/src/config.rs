//! Hawk options loaded from the environment.

use apiguard_core::{env_bool, env_parse, env_string};

use crate::algorithm::Algorithm;

/// Runtime options of the authentication engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HawkOptions {
    /// Authenticate requests at all. When off, every request is admitted.
    pub enabled: bool,
    /// Attach `Server-Authorization` to responses of signed requests.
    pub sign_responses: bool,
    /// Authenticate through an existing session instead of a MAC when one is present.
    pub allow_cookie_auth: bool,
    /// Algorithm attached to resolved credentials.
    pub algorithm: Algorithm,
    /// Skip payload verification for requests that carry no `hash`.
    pub accept_untrusted_content: bool,
    /// Seconds added to the server clock before the freshness check.
    pub localtime_offset_secs: i64,
    /// Maximum distance in seconds between the request timestamp and server time.
    pub timestamp_skew_secs: i64,
    /// Scheme assumed for the default port when the request line has none.
    pub default_scheme: String,
}

impl Default for HawkOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            sign_responses: false,
            allow_cookie_auth: false,
            algorithm: Algorithm::Sha256,
            accept_untrusted_content: false,
            localtime_offset_secs: 0,
            timestamp_skew_secs: 60,
            default_scheme: "http".to_owned(),
        }
    }
}

impl HawkOptions {
    /// Load options from `HAWK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_bool("HAWK_ENABLED", defaults.enabled),
            sign_responses: env_bool("HAWK_SIGN_RESPONSE", defaults.sign_responses),
            allow_cookie_auth: env_bool("HAWK_ALLOW_COOKIE_AUTH", defaults.allow_cookie_auth),
            algorithm: env_parse("HAWK_ALGORITHM", defaults.algorithm),
            accept_untrusted_content: env_bool(
                "HAWK_ACCEPT_UNTRUSTED_CONTENT",
                defaults.accept_untrusted_content,
            ),
            localtime_offset_secs: env_parse(
                "HAWK_LOCALTIME_OFFSET_IN_SECONDS",
                defaults.localtime_offset_secs,
            ),
            timestamp_skew_secs: env_parse(
                "HAWK_TIMESTAMP_SKEW_IN_SECONDS",
                defaults.timestamp_skew_secs,
            )
            .max(0),
            default_scheme: env_string("HAWK_DEFAULT_SCHEME", &defaults.default_scheme),
        }
    }
}
