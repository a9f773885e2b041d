//! Content negotiation for apiguard.
//!
//! Given the `Accept` header of a request and the set of representations the
//! server can produce, this crate decides which representation to send, or
//! that none is acceptable (406).
//!
//! # Usage
//!
//! ```rust
//! use apiguard_negotiation::{FormatterRegistry, NegotiationResult, parse_accept};
//!
//! let registry = FormatterRegistry::builder().build().unwrap();
//! let accept = parse_accept(Some("application/xml,application/json"));
//!
//! match registry.negotiate(&accept) {
//!     NegotiationResult::Selected { media_type, .. } => assert_eq!(media_type, "application/json"),
//!     NegotiationResult::NotAcceptable { .. } => unreachable!(),
//! }
//! ```
//!
//! # Modules
//!
//! - [`accept`] - Quality-value parsing of `Accept` headers
//! - [`config`] - Negotiation options loaded from the environment
//! - [`error`] - Formatter and registry error types
//! - [`negotiate`] - Representation selection
//! - [`registry`] - Formatter trait, built-in JSON formatter and the registry
//! - [`xml`] - XML formatter for structured payloads

pub mod accept;
pub mod config;
pub mod error;
pub mod negotiate;
pub mod registry;
pub mod xml;

pub use accept::{AcceptHeader, MediaTypePreference, parse_accept};
pub use config::{NegotiationOptions, NegotiationPolicy};
pub use error::{FormatError, RegistryError};
pub use negotiate::{NegotiationResult, negotiate};
pub use registry::{FormatContext, Formatter, FormatterRegistry, FormatterRegistryBuilder, JsonFormatter};
pub use xml::XmlFormatter;
