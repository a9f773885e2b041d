//! Representation selection.
//!
//! The policy is intentionally simple: walk the client's preferences and stop
//! at the first one the server can honor.
//!
//! 1. No preference declared: use the default media type.
//! 2. For each acceptable preference (`q > 0`), in policy order:
//!    - `*/*` selects the default media type;
//!    - a registered media type selects itself.
//! 3. Nothing matched: 406 with every registered media type.
//!
//! Under [`NegotiationPolicy::FirstListed`] the declared order decides and
//! quality values only gate acceptance, so `application/xml;q=0.1,
//! application/json` still picks XML when both are registered. This is not
//! RFC 7231 weighted negotiation. [`NegotiationPolicy::Weighted`] sorts by
//! descending quality first (stable, so ties keep declared order).

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::accept::{AcceptHeader, MediaTypePreference};
use crate::config::NegotiationPolicy;
use crate::registry::{Formatter, FormatterRegistry};

/// Outcome of content negotiation.
#[derive(Clone)]
pub enum NegotiationResult {
    /// A representation was selected.
    Selected {
        /// The selected media type, always a registry key.
        media_type: String,
        /// The formatter registered for it.
        formatter: Arc<dyn Formatter>,
    },
    /// No registered representation is acceptable to the client.
    NotAcceptable {
        /// Every registered media type, in registration order.
        available_media_types: Vec<String>,
    },
}

impl NegotiationResult {
    /// The selected media type, if any.
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        match self {
            Self::Selected { media_type, .. } => Some(media_type),
            Self::NotAcceptable { .. } => None,
        }
    }
}

impl fmt::Debug for NegotiationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selected { media_type, .. } => f
                .debug_struct("Selected")
                .field("media_type", media_type)
                .finish_non_exhaustive(),
            Self::NotAcceptable {
                available_media_types,
            } => f
                .debug_struct("NotAcceptable")
                .field("available_media_types", available_media_types)
                .finish(),
        }
    }
}

/// Select a representation for `accept` from `registry`.
#[must_use]
pub fn negotiate(
    accept: &AcceptHeader,
    registry: &FormatterRegistry,
    policy: NegotiationPolicy,
) -> NegotiationResult {
    let prefs = match accept {
        AcceptHeader::Any => return select(registry, registry.default_media_type()),
        AcceptHeader::Preferences(prefs) => ordered(prefs, policy),
    };

    for pref in prefs.into_iter().filter(|p| p.is_acceptable()) {
        if pref.is_wildcard() {
            return select(registry, registry.default_media_type());
        }
        if registry.contains(&pref.media_type) {
            return select(registry, &pref.media_type);
        }
    }

    let available_media_types = registry.media_types();
    debug!(?available_media_types, "no acceptable representation");
    NegotiationResult::NotAcceptable {
        available_media_types,
    }
}

fn ordered(prefs: &[MediaTypePreference], policy: NegotiationPolicy) -> Vec<&MediaTypePreference> {
    let mut ordered: Vec<&MediaTypePreference> = prefs.iter().collect();
    match policy {
        NegotiationPolicy::FirstListed => ordered.sort_by_key(|p| p.order),
        NegotiationPolicy::Weighted => ordered.sort_by(|a, b| {
            b.quality
                .total_cmp(&a.quality)
                .then_with(|| a.order.cmp(&b.order))
        }),
    }
    ordered
}

fn select(registry: &FormatterRegistry, media_type: &str) -> NegotiationResult {
    let formatter = registry
        .get(media_type)
        .unwrap_or_else(|| registry.default_formatter());
    debug!(media_type, "selected representation");
    NegotiationResult::Selected {
        media_type: media_type.to_owned(),
        formatter,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::accept::parse_accept;
    use crate::error::FormatError;
    use crate::registry::FormatContext;

    fn dummy_xml(_: &Value, _: &FormatContext) -> Result<Vec<u8>, FormatError> {
        Ok(b"<hello>world</hello>".to_vec())
    }

    fn json_only() -> FormatterRegistry {
        FormatterRegistry::builder().build().unwrap()
    }

    fn json_and_xml() -> FormatterRegistry {
        FormatterRegistry::builder()
            .register("application/xml", dummy_xml)
            .build()
            .unwrap()
    }

    fn selected(registry: &FormatterRegistry, accept: Option<&str>) -> Option<String> {
        registry
            .negotiate(&parse_accept(accept))
            .media_type()
            .map(ToOwned::to_owned)
    }

    #[test]
    fn test_should_select_default_without_accept_header() {
        assert_eq!(selected(&json_only(), None).as_deref(), Some("application/json"));
        assert_eq!(selected(&json_only(), Some("")).as_deref(), Some("application/json"));
    }

    #[test]
    fn test_should_select_default_for_wildcard() {
        let registry = FormatterRegistry::builder()
            .register("application/xml", dummy_xml)
            .default_media_type("application/xml")
            .build()
            .unwrap();
        assert_eq!(selected(&registry, Some("*/*")).as_deref(), Some("application/xml"));
    }

    #[test]
    fn test_should_pick_first_supported_in_declared_order() {
        assert_eq!(
            selected(&json_only(), Some("application/xml,application/json")).as_deref(),
            Some("application/json")
        );
        assert_eq!(
            selected(&json_and_xml(), Some("application/xml,application/json")).as_deref(),
            Some("application/xml")
        );
    }

    #[test]
    fn test_should_ignore_quality_magnitude_when_first_listed() {
        assert_eq!(
            selected(&json_and_xml(), Some("application/xml;q=0.1,application/json;q=0.9"))
                .as_deref(),
            Some("application/xml")
        );
    }

    #[test]
    fn test_should_order_by_quality_when_weighted() {
        let registry = FormatterRegistry::builder()
            .register("application/xml", dummy_xml)
            .policy(NegotiationPolicy::Weighted)
            .build()
            .unwrap();
        assert_eq!(
            selected(&registry, Some("application/xml;q=0.5,application/json")).as_deref(),
            Some("application/json")
        );
        assert_eq!(
            selected(&registry, Some("application/xml,application/json")).as_deref(),
            Some("application/xml")
        );
    }

    #[test]
    fn test_should_skip_zero_quality_entries() {
        assert_eq!(
            selected(&json_and_xml(), Some("application/xml;q=0,application/json")).as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_should_stop_at_wildcard_before_later_specific_types() {
        assert_eq!(
            selected(&json_and_xml(), Some("text/html,*/*,application/xml")).as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_should_refuse_with_full_registry_listing() {
        let result = json_and_xml().negotiate(&parse_accept(Some(
            "application/vnd.company.myapp.product-v2+xml",
        )));
        match result {
            NegotiationResult::NotAcceptable {
                available_media_types,
            } => assert_eq!(
                available_media_types,
                vec!["application/json", "application/xml"]
            ),
            other @ NegotiationResult::Selected { .. } => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_should_not_treat_partial_wildcard_as_universal() {
        let result = json_only().negotiate(&parse_accept(Some("blah/*")));
        assert!(matches!(result, NegotiationResult::NotAcceptable { .. }));
    }
}
