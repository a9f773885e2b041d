//! What a handler hands back to the pipeline.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Media type of raw output when none is given.
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Handler output.
///
/// Structured payloads go through content negotiation; raw output is sent
/// exactly as produced.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// A structured payload rendered with the negotiated formatter.
    Payload {
        /// The payload.
        value: Value,
        /// Response status.
        status: StatusCode,
        /// Extra response headers.
        headers: HeaderMap,
    },
    /// A preformatted body that bypasses negotiation.
    Raw {
        /// The body.
        body: Bytes,
        /// Its media type.
        content_type: String,
        /// Response status.
        status: StatusCode,
        /// Extra response headers.
        headers: HeaderMap,
    },
}

impl HandlerOutput {
    /// A `200 OK` structured payload.
    #[must_use]
    pub fn payload(value: Value) -> Self {
        Self::Payload {
            value,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// A `200 OK` raw body sent as `text/html`.
    #[must_use]
    pub fn raw(body: impl Into<Bytes>) -> Self {
        Self::raw_with_type(body, TEXT_HTML)
    }

    /// A `200 OK` raw body with an explicit media type.
    #[must_use]
    pub fn raw_with_type(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self::Raw {
            body: body.into(),
            content_type: content_type.into(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Replace the status.
    #[must_use]
    pub fn with_status(mut self, new_status: StatusCode) -> Self {
        match &mut self {
            Self::Payload { status, .. } | Self::Raw { status, .. } => *status = new_status,
        }
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        match &mut self {
            Self::Payload { headers, .. } | Self::Raw { headers, .. } => {
                headers.insert(name, value);
            }
        }
        self
    }

    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Payload { status, .. } | Self::Raw { status, .. } => *status,
        }
    }
}

impl From<Value> for HandlerOutput {
    fn from(value: Value) -> Self {
        Self::payload(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_ok() {
        assert_eq!(HandlerOutput::payload(Value::Null).status(), StatusCode::OK);
        assert_eq!(HandlerOutput::raw("x").status(), StatusCode::OK);
    }

    #[test]
    fn test_should_override_status_and_headers() {
        let output = HandlerOutput::payload(serde_json::json!({"id": 1}))
            .with_status(StatusCode::CREATED)
            .with_header(
                http::header::LOCATION,
                http::HeaderValue::from_static("/items/1"),
            );
        assert_eq!(output.status(), StatusCode::CREATED);
        match output {
            HandlerOutput::Payload { headers, .. } => {
                assert_eq!(headers[http::header::LOCATION], "/items/1");
            }
            HandlerOutput::Raw { .. } => panic!("expected payload"),
        }
    }

    #[test]
    fn test_should_send_raw_output_as_html() {
        match HandlerOutput::raw("<p>hi</p>") {
            HandlerOutput::Raw { content_type, .. } => assert_eq!(content_type, TEXT_HTML),
            HandlerOutput::Payload { .. } => panic!("expected raw"),
        }
    }
}
