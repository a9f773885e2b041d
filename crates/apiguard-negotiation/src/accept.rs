//! Quality-value parsing of `Accept` headers.
//!
//! The header is a comma-separated list of `media-type[;param=value]*` entries,
//! where the `q` parameter carries a weight in `[0, 1]`:
//!
//! ```text
//! Accept: application/xml;q=0.9, application/json, */*;q=0.1
//! ```
//!
//! Parsing never fails. A malformed quality is read as `1.0`, and empty entries
//! are dropped. An absent header, or one without a single usable entry, means
//! the client declared no preference at all ([`AcceptHeader::Any`]).

use http::HeaderMap;

/// The universal wildcard media range.
pub const WILDCARD: &str = "*/*";

/// One entry of a parsed `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypePreference {
    /// Lowercased media type or range, without parameters.
    pub media_type: String,
    /// Weight in `[0, 1]`.
    pub quality: f32,
    /// Position in the original header, starting at 0.
    pub order: usize,
}

impl MediaTypePreference {
    /// Whether this entry is the universal wildcard `*/*`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.media_type == WILDCARD
    }

    /// Whether the client is willing to receive this media type at all.
    ///
    /// An explicit `q=0` marks the type as not acceptable.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.quality > 0.0
    }
}

/// The parsed value of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptHeader {
    /// No preference declared: any representation will do.
    Any,
    /// Declared preferences in header order.
    Preferences(Vec<MediaTypePreference>),
}

impl AcceptHeader {
    /// Parse every `Accept` header of a request, joining repeated headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let values: Vec<&str> = headers
            .get_all(http::header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        if values.is_empty() {
            return Self::Any;
        }
        parse_accept(Some(&values.join(",")))
    }

    /// The declared preferences, empty for [`AcceptHeader::Any`].
    #[must_use]
    pub fn preferences(&self) -> &[MediaTypePreference] {
        match self {
            Self::Any => &[],
            Self::Preferences(prefs) => prefs,
        }
    }
}

/// Parse a raw `Accept` header value.
///
/// # Examples
///
/// ```
/// use apiguard_negotiation::accept::{AcceptHeader, parse_accept};
///
/// assert_eq!(parse_accept(None), AcceptHeader::Any);
///
/// let accept = parse_accept(Some("application/xml;q=0.5, application/json"));
/// let prefs = accept.preferences();
/// assert_eq!(prefs[0].media_type, "application/xml");
/// assert!((prefs[0].quality - 0.5).abs() < f32::EPSILON);
/// assert_eq!(prefs[1].order, 1);
/// ```
#[must_use]
pub fn parse_accept(raw: Option<&str>) -> AcceptHeader {
    let Some(raw) = raw else {
        return AcceptHeader::Any;
    };

    let prefs: Vec<MediaTypePreference> = raw
        .split(',')
        .filter_map(parse_entry)
        .enumerate()
        .map(|(order, (media_type, quality))| MediaTypePreference {
            media_type,
            quality,
            order,
        })
        .collect();

    if prefs.is_empty() {
        AcceptHeader::Any
    } else {
        AcceptHeader::Preferences(prefs)
    }
}

/// Parse one `media-type;params` entry into its type and quality.
fn parse_entry(entry: &str) -> Option<(String, f32)> {
    let mut parts = entry.split(';');
    let media_type = parts.next()?.trim();
    if media_type.is_empty() {
        return None;
    }

    let quality = parts
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| parse_quality(value))
        .unwrap_or(1.0);

    Some((media_type.to_ascii_lowercase(), quality))
}

/// Parse a quality value, rejecting anything outside `[0, 1]`.
///
/// ```
/// use apiguard_negotiation::accept::parse_quality;
///
/// assert_eq!(parse_quality("0.5"), Some(0.5));
/// assert_eq!(parse_quality("1.5"), None);
/// assert_eq!(parse_quality("abc"), None);
/// ```
#[must_use]
pub fn parse_quality(value: &str) -> Option<f32> {
    let value = value.trim().trim_matches('"');
    let q: f32 = value.parse().ok()?;
    (q.is_finite() && (0.0..=1.0).contains(&q)).then_some(q)
}
