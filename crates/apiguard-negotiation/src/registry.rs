//! Formatters and the registry that maps media types to them.
//!
//! A [`Formatter`] turns a structured payload (a JSON value) into the bytes of
//! one representation. The [`FormatterRegistry`] is assembled once at start-up
//! through [`FormatterRegistryBuilder`] and is read-only afterwards, so it can
//! be shared across requests behind an `Arc` without locking.

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use serde_json::Value;

use crate::accept::AcceptHeader;
use crate::config::{NegotiationOptions, NegotiationPolicy};
use crate::error::{FormatError, RegistryError};
use crate::negotiate::{NegotiationResult, negotiate};

/// Media type of the built-in JSON formatter.
pub const APPLICATION_JSON: &str = "application/json";

/// Per-request information available to formatters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatContext {
    /// The request was issued by `XMLHttpRequest`.
    pub xhr: bool,
}

impl FormatContext {
    /// Derive the context from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let xhr = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"));
        Self { xhr }
    }
}

/// Serializes a structured payload into one representation.
///
/// Any `Fn(&Value, &FormatContext) -> Result<Vec<u8>, FormatError>` is a formatter:
///
/// ```
/// use apiguard_negotiation::{FormatContext, FormatError, FormatterRegistry};
///
/// let registry = FormatterRegistry::builder()
///     .register("text/plain", |value: &serde_json::Value, _: &FormatContext| {
///         Ok::<_, FormatError>(value.to_string().into_bytes())
///     })
///     .build()
///     .unwrap();
/// assert!(registry.get("text/plain").is_some());
/// ```
pub trait Formatter: Send + Sync {
    /// Render `payload` into bytes.
    fn format(&self, payload: &Value, ctx: &FormatContext) -> Result<Vec<u8>, FormatError>;
}

impl<F> Formatter for F
where
    F: Fn(&Value, &FormatContext) -> Result<Vec<u8>, FormatError> + Send + Sync,
{
    fn format(&self, payload: &Value, ctx: &FormatContext) -> Result<Vec<u8>, FormatError> {
        self(payload, ctx)
    }
}

/// The built-in `application/json` formatter.
///
/// With `pretty` set, output is indented by two spaces unless the request is
/// an XHR, in which case compact output is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    /// Indent output for non-XHR requests.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a JSON formatter.
    #[must_use]
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, payload: &Value, ctx: &FormatContext) -> Result<Vec<u8>, FormatError> {
        if self.pretty && !ctx.xhr {
            Ok(serde_json::to_vec_pretty(payload)?)
        } else {
            Ok(serde_json::to_vec(payload)?)
        }
    }
}

/// Immutable mapping from media type to formatter.
///
/// Listing order is registration order; the default media type always has a
/// formatter.
#[derive(Clone)]
pub struct FormatterRegistry {
    entries: Vec<(String, Arc<dyn Formatter>)>,
    default_media_type: String,
    policy: NegotiationPolicy,
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("media_types", &self.media_types())
            .field("default_media_type", &self.default_media_type)
            .field("policy", &self.policy)
            .finish()
    }
}

impl FormatterRegistry {
    /// Start a registry with the JSON formatter registered as the default.
    #[must_use]
    pub fn builder() -> FormatterRegistryBuilder {
        FormatterRegistryBuilder::empty().register(APPLICATION_JSON, JsonFormatter::default())
    }

    /// Start a registry configured from [`NegotiationOptions`].
    ///
    /// The JSON formatter honors `pretty_print`. If the default media type is
    /// not JSON, the caller must register a formatter for it before `build`.
    #[must_use]
    pub fn builder_from_options(options: &NegotiationOptions) -> FormatterRegistryBuilder {
        FormatterRegistryBuilder::empty()
            .register(APPLICATION_JSON, JsonFormatter::new(options.pretty_print))
            .default_media_type(&options.default_media_type)
            .policy(options.policy)
    }

    /// Look up the formatter for a media type.
    #[must_use]
    pub fn get(&self, media_type: &str) -> Option<Arc<dyn Formatter>> {
        self.entries
            .iter()
            .find(|(key, _)| key == media_type)
            .map(|(_, formatter)| Arc::clone(formatter))
    }

    /// Whether a formatter is registered for `media_type`.
    #[must_use]
    pub fn contains(&self, media_type: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == media_type)
    }

    /// All registered media types in registration order.
    #[must_use]
    pub fn media_types(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// The media type used when the client has no preference.
    #[must_use]
    pub fn default_media_type(&self) -> &str {
        &self.default_media_type
    }

    /// The formatter for the default media type.
    #[must_use]
    pub fn default_formatter(&self) -> Arc<dyn Formatter> {
        self.get(&self.default_media_type)
            .expect("default formatter presence is checked by the builder")
    }

    /// The ordering policy applied by [`FormatterRegistry::negotiate`].
    #[must_use]
    pub fn policy(&self) -> NegotiationPolicy {
        self.policy
    }

    /// Negotiate a representation for the given `Accept` header.
    #[must_use]
    pub fn negotiate(&self, accept: &AcceptHeader) -> NegotiationResult {
        negotiate(accept, self, self.policy)
    }

    /// Render the 406 body, `{"mimetypes": [...]}`, with the default formatter.
    pub fn render_not_acceptable(
        &self,
        available: &[String],
        ctx: &FormatContext,
    ) -> Result<Vec<u8>, FormatError> {
        let payload = serde_json::json!({ "mimetypes": available });
        self.default_formatter().format(&payload, ctx)
    }
}

/// Configuration-time builder for [`FormatterRegistry`].
#[derive(Default)]
pub struct FormatterRegistryBuilder {
    entries: Vec<(String, Arc<dyn Formatter>)>,
    default_media_type: Option<String>,
    policy: NegotiationPolicy,
}

impl fmt::Debug for FormatterRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.entries.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("FormatterRegistryBuilder")
            .field("media_types", &keys)
            .field("default_media_type", &self.default_media_type)
            .field("policy", &self.policy)
            .finish()
    }
}

impl FormatterRegistryBuilder {
    /// A builder with no formatters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register `formatter` for `media_type`.
    ///
    /// Registering the same media type again replaces the formatter but keeps
    /// its original listing position.
    #[must_use]
    pub fn register(mut self, media_type: &str, formatter: impl Formatter + 'static) -> Self {
        let key = media_type.trim().to_ascii_lowercase();
        let formatter: Arc<dyn Formatter> = Arc::new(formatter);
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = formatter;
        } else {
            self.entries.push((key, formatter));
        }
        self
    }

    /// Set the default media type. Defaults to the first registered type.
    #[must_use]
    pub fn default_media_type(mut self, media_type: &str) -> Self {
        self.default_media_type = Some(media_type.trim().to_ascii_lowercase());
        self
    }

    /// Set the ordering policy.
    #[must_use]
    pub fn policy(mut self, policy: NegotiationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingDefaultFormatter`] if the default media
    /// type has no formatter (or nothing was registered).
    pub fn build(self) -> Result<FormatterRegistry, RegistryError> {
        let default_media_type = match self.default_media_type {
            Some(media_type) => media_type,
            None => self
                .entries
                .first()
                .map(|(key, _)| key.clone())
                .unwrap_or_else(|| APPLICATION_JSON.to_owned()),
        };

        if !self.entries.iter().any(|(key, _)| *key == default_media_type) {
            return Err(RegistryError::MissingDefaultFormatter(default_media_type));
        }

        Ok(FormatterRegistry {
            entries: self.entries,
            default_media_type,
            policy: self.policy,
        })
    }
}
