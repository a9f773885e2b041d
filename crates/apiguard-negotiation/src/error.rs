//! Error types for formatting and registry configuration.

use apiguard_core::ApiError;

/// Errors raised by a [`Formatter`](crate::Formatter) while rendering a payload.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// XML serialization failed.
    #[error("XML serialization failed: {0}")]
    Xml(String),

    /// The payload shape cannot be represented by this formatter.
    #[error("unsupported payload: {0}")]
    Unsupported(String),
}

/// Errors raised while building a [`FormatterRegistry`](crate::FormatterRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The default media type has no registered formatter.
    #[error("no formatter registered for default media type {0}")]
    MissingDefaultFormatter(String),
}

impl From<FormatError> for ApiError {
    fn from(err: FormatError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self::configuration(err.to_string())
    }
}
