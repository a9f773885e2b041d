//! Negotiation options.

use std::fmt;
use std::str::FromStr;

use apiguard_core::{env_bool, env_parse, env_string};

/// How declared preferences are ordered before matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegotiationPolicy {
    /// First declared, supported type wins; quality only gates acceptance.
    #[default]
    FirstListed,
    /// Higher quality first; equal qualities keep their declared order.
    Weighted,
}

impl FromStr for NegotiationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-listed" | "first_listed" | "declared" => Ok(Self::FirstListed),
            "weighted" | "quality" => Ok(Self::Weighted),
            other => Err(format!("unknown negotiation policy: {other}")),
        }
    }
}

impl fmt::Display for NegotiationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstListed => "first-listed",
            Self::Weighted => "weighted",
        })
    }
}

/// Options controlling the formatter registry and negotiation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationOptions {
    /// Media type used when the client declares no preference or `*/*`.
    pub default_media_type: String,
    /// Indent JSON output for non-XHR requests.
    pub pretty_print: bool,
    /// Ordering policy for declared preferences.
    pub policy: NegotiationPolicy,
}

impl Default for NegotiationOptions {
    fn default() -> Self {
        Self {
            default_media_type: "application/json".to_owned(),
            pretty_print: false,
            policy: NegotiationPolicy::FirstListed,
        }
    }
}

impl NegotiationOptions {
    /// Create options from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_media_type: env_string("DEFAULT_MIMETYPE", &defaults.default_media_type),
            pretty_print: env_bool("JSONIFY_PRETTYPRINT_REGULAR", defaults.pretty_print),
            policy: env_parse("NEGOTIATION_POLICY", defaults.policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_policy_names() {
        assert_eq!(
            "first-listed".parse::<NegotiationPolicy>(),
            Ok(NegotiationPolicy::FirstListed)
        );
        assert_eq!("Weighted".parse::<NegotiationPolicy>(), Ok(NegotiationPolicy::Weighted));
        assert!("random".parse::<NegotiationPolicy>().is_err());
    }

    #[test]
    fn test_should_default_to_json_and_first_listed() {
        let options = NegotiationOptions::default();
        assert_eq!(options.default_media_type, "application/json");
        assert_eq!(options.policy, NegotiationPolicy::FirstListed);
        assert!(!options.pretty_print);
    }

    #[test]
    fn test_should_serialize_policy_in_kebab_case() {
        let value = serde_json::to_value(NegotiationOptions::default()).unwrap();
        assert_eq!(value["policy"], "first-listed");
        assert_eq!(value["defaultMediaType"], "application/json");
    }
}
