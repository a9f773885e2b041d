//! Error taxonomy shared by the negotiation and authentication layers.
//!
//! Every per-request failure is eventually expressed as an [`ApiError`] and
//! rendered by the HTTP boundary. The taxonomy is deliberately small:
//!
//! | Kind | Status | Meaning |
//! |------|--------|---------|
//! | [`ErrorKind::BadRequest`] | 400 | Malformed client input (scheme, fields, payload hash) |
//! | [`ErrorKind::Unauthorized`] | 401 | Identity, MAC, timestamp, nonce or session failure |
//! | [`ErrorKind::NotAcceptable`] | 406 | No registered representation matches `Accept` |
//! | [`ErrorKind::Configuration`] | 500 | The host forgot to register a required capability |
//! | [`ErrorKind::Internal`] | 500 | Anything else (serialization failures, I/O) |

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or unparseable client input.
    BadRequest,
    /// Credential, identity, MAC, timestamp, nonce or session failure.
    Unauthorized,
    /// Content negotiation failed.
    NotAcceptable,
    /// A required capability was never registered by the host.
    Configuration,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// The HTTP status code the boundary uses for this kind.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::Configuration | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An error that terminates request processing and becomes an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.message())]
pub struct ApiError {
    /// The error classification.
    pub kind: ErrorKind,
    /// Optional human-readable detail. Never contains secret material.
    pub detail: Option<String>,
}

impl ApiError {
    /// Create an error of the given kind without detail.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    /// Create an error of the given kind with a detail message.
    #[must_use]
    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// Shorthand for a 400 error.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::BadRequest, detail)
    }

    /// Shorthand for a 401 error.
    #[must_use]
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Unauthorized, detail)
    }

    /// Shorthand for a configuration error.
    #[must_use]
    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Configuration, detail)
    }

    /// Shorthand for an internal error.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Internal, detail)
    }

    /// The HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// The client-facing message, e.g. `401 Unauthorized: stale timestamp`.
    ///
    /// Configuration and internal errors never expose their detail; it is
    /// meant for server logs only.
    #[must_use]
    pub fn message(&self) -> String {
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Unknown");
        match (&self.detail, self.kind) {
            (Some(detail), ErrorKind::BadRequest | ErrorKind::Unauthorized | ErrorKind::NotAcceptable) => {
                format!("{} {reason}: {detail}", status.as_u16())
            }
            _ => format!("{} {reason}", status.as_u16()),
        }
    }

    /// The structured `{"code", "message"}` body for this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.status_code().as_u16(),
            message: self.message(),
        }
    }
}

/// Structured error payload rendered by the default error formatter.
///
/// ```json
/// {"code": 401, "message": "401 Unauthorized: stale timestamp"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl ErrorBody {
    /// Convert into a JSON value suitable for negotiation.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
        })
    }
}

/// Convenience result type for apiguard operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_kinds_to_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::NotAcceptable.status_code(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            ErrorKind::Configuration.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_should_format_message_with_detail() {
        let err = ApiError::unauthorized("stale timestamp");
        assert_eq!(err.message(), "401 Unauthorized: stale timestamp");
        assert_eq!(err.to_string(), "401 Unauthorized: stale timestamp");
    }

    #[test]
    fn test_should_format_message_without_detail() {
        let err = ApiError::new(ErrorKind::BadRequest);
        assert_eq!(err.message(), "400 Bad Request");
    }

    #[test]
    fn test_should_hide_configuration_detail_from_clients() {
        let err = ApiError::configuration("no credential resolver registered");
        assert_eq!(err.message(), "500 Internal Server Error");
        assert_eq!(err.detail.as_deref(), Some("no credential resolver registered"));
    }

    #[test]
    fn test_should_build_code_and_message_body() {
        let body = ApiError::bad_request("unknown scheme: blah").to_body();
        assert_eq!(body.code, 400);
        let value = body.to_value();
        assert_eq!(value["code"], 400);
        assert_eq!(value["message"], "400 Bad Request: unknown scheme: blah");
    }
}
