//! Rendering handler output and errors into responses.
//!
//! Structured payloads and structured errors are negotiated against the
//! request's `Accept` header. A payload nobody can accept becomes a 406 whose
//! body lists every registered media type; an error nobody can accept is
//! still rendered, with the default formatter.

use std::sync::Arc;

use apiguard_core::{ApiError, ErrorKind};
use apiguard_negotiation::{AcceptHeader, FormatContext, FormatterRegistry, NegotiationResult};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde_json::Value;
use tracing::{error, warn};

use crate::output::HandlerOutput;

/// Media type of unstructured error responses.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Renders handler results using a formatter registry.
#[derive(Debug, Clone)]
pub struct Responder {
    registry: Arc<FormatterRegistry>,
    structured_errors: bool,
}

impl Responder {
    /// Create a responder.
    #[must_use]
    pub fn new(registry: Arc<FormatterRegistry>, structured_errors: bool) -> Self {
        Self {
            registry,
            structured_errors,
        }
    }

    /// The registry used for negotiation.
    #[must_use]
    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Render a handler result.
    #[must_use]
    pub fn render(
        &self,
        request_headers: &HeaderMap,
        result: Result<HandlerOutput, ApiError>,
    ) -> http::Response<Bytes> {
        match result {
            Ok(output) => self.render_output(request_headers, output),
            Err(err) => self.render_error(request_headers, &err),
        }
    }

    /// Render handler output, negotiating structured payloads.
    #[must_use]
    pub fn render_output(
        &self,
        request_headers: &HeaderMap,
        output: HandlerOutput,
    ) -> http::Response<Bytes> {
        match output {
            HandlerOutput::Raw {
                body,
                content_type,
                status,
                headers,
            } => with_headers(build(status, &content_type, body), headers),
            HandlerOutput::Payload {
                value,
                status,
                headers,
            } => {
                let ctx = FormatContext::from_headers(request_headers);
                match self
                    .registry
                    .negotiate(&AcceptHeader::from_headers(request_headers))
                {
                    NegotiationResult::Selected {
                        media_type,
                        formatter,
                    } => match formatter.format(&value, &ctx) {
                        Ok(body) => with_headers(
                            vary_accept(build(status, &media_type, Bytes::from(body))),
                            headers,
                        ),
                        Err(err) => self.render_error(request_headers, &err.into()),
                    },
                    NegotiationResult::NotAcceptable {
                        available_media_types,
                    } => self.not_acceptable(&available_media_types, &ctx),
                }
            }
        }
    }

    /// Render an error.
    #[must_use]
    pub fn render_error(&self, request_headers: &HeaderMap, err: &ApiError) -> http::Response<Bytes> {
        match err.kind {
            ErrorKind::Configuration | ErrorKind::Internal => {
                error!(kind = ?err.kind, detail = ?err.detail, "request failed");
            }
            _ => warn!(status = %err.status_code(), message = %err.message(), "request rejected"),
        }

        if !self.structured_errors {
            return plain_error(err);
        }

        let ctx = FormatContext::from_headers(request_headers);
        let (media_type, formatter) = match self
            .registry
            .negotiate(&AcceptHeader::from_headers(request_headers))
        {
            NegotiationResult::Selected {
                media_type,
                formatter,
            } => (media_type, formatter),
            NegotiationResult::NotAcceptable { .. } => (
                self.registry.default_media_type().to_owned(),
                self.registry.default_formatter(),
            ),
        };

        match formatter.format(&err.to_body().to_value(), &ctx) {
            Ok(body) => vary_accept(build(err.status_code(), &media_type, Bytes::from(body))),
            Err(format_err) => {
                error!(error = %format_err, "failed to format error body");
                plain_error(err)
            }
        }
    }

    fn not_acceptable(&self, available: &[String], ctx: &FormatContext) -> http::Response<Bytes> {
        match self.registry.render_not_acceptable(available, ctx) {
            Ok(body) => vary_accept(build(
                StatusCode::NOT_ACCEPTABLE,
                self.registry.default_media_type(),
                Bytes::from(body),
            )),
            Err(err) => {
                error!(error = %err, "failed to format 406 body");
                plain_error(&ApiError::new(ErrorKind::NotAcceptable))
            }
        }
    }
}

fn build(status: StatusCode, content_type: &str, body: Bytes) -> http::Response<Bytes> {
    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

fn with_headers(mut response: http::Response<Bytes>, headers: HeaderMap) -> http::Response<Bytes> {
    response.headers_mut().extend(headers);
    response
}

fn vary_accept(mut response: http::Response<Bytes>) -> http::Response<Bytes> {
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("Accept"));
    response
}

fn plain_error(err: &ApiError) -> http::Response<Bytes> {
    build(err.status_code(), TEXT_PLAIN, Bytes::from(err.message()))
}

/// Parse a rendered JSON body, for tests and diagnostics.
#[must_use]
pub fn json_body(response: &http::Response<Bytes>) -> Option<Value> {
    serde_json::from_slice(response.body()).ok()
}

#[cfg(test)]
mod tests {
    use apiguard_negotiation::XmlFormatter;

    use super::*;

    fn responder(structured_errors: bool) -> Responder {
        let registry = FormatterRegistry::builder()
            .register("application/xml", XmlFormatter::default())
            .build()
            .unwrap();
        Responder::new(Arc::new(registry), structured_errors)
    }

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, value.parse().unwrap());
        headers
    }

    fn content_type(response: &http::Response<Bytes>) -> &str {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    #[test]
    fn test_should_render_payload_with_default_formatter() {
        let response = responder(true).render_output(
            &HeaderMap::new(),
            HandlerOutput::payload(serde_json::json!({"hello": "world"})),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "application/json");
        assert_eq!(json_body(&response).unwrap()["hello"], "world");
        assert_eq!(response.headers()[header::VARY], "Accept");
    }

    #[test]
    fn test_should_render_payload_with_negotiated_formatter() {
        let response = responder(true).render_output(
            &accept("application/xml"),
            HandlerOutput::payload(serde_json::json!({"hello": "world"})),
        );
        assert_eq!(content_type(&response), "application/xml");
        assert!(
            String::from_utf8_lossy(response.body()).contains("<hello>world</hello>")
        );
    }

    #[test]
    fn test_should_refuse_unacceptable_payload() {
        let response = responder(true).render_output(
            &accept("application/vnd.company.myapp.product-v2+xml"),
            HandlerOutput::payload(serde_json::json!({"hello": "world"})),
        );
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(content_type(&response), "application/json");
        assert_eq!(
            json_body(&response).unwrap(),
            serde_json::json!({"mimetypes": ["application/json", "application/xml"]})
        );
    }

    #[test]
    fn test_should_pass_raw_output_through() {
        let response = responder(true).render_output(
            &accept("application/vnd.unknown"),
            HandlerOutput::raw("<p>hello</p>"),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        assert_eq!(response.body().as_ref(), b"<p>hello</p>");
    }

    #[test]
    fn test_should_render_structured_error() {
        let response = responder(true).render_error(
            &HeaderMap::new(),
            &ApiError::unauthorized("stale timestamp"),
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(&response).unwrap(),
            serde_json::json!({"code": 401, "message": "401 Unauthorized: stale timestamp"})
        );
    }

    #[test]
    fn test_should_render_error_even_when_unacceptable() {
        let response = responder(true).render_error(
            &accept("image/png"),
            &ApiError::bad_request("unknown scheme: blah"),
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&response), "application/json");
    }

    #[test]
    fn test_should_render_plain_error_when_unstructured() {
        let response =
            responder(false).render_error(&HeaderMap::new(), &ApiError::unauthorized("MAC mismatch"));
        assert_eq!(content_type(&response), TEXT_PLAIN);
        assert_eq!(response.body().as_ref(), b"401 Unauthorized: MAC mismatch");
    }

    #[test]
    fn test_should_hide_internal_detail() {
        let response = responder(true).render_error(
            &HeaderMap::new(),
            &ApiError::configuration("no credential resolver registered"),
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8_lossy(response.body()).into_owned();
        assert!(!body.contains("resolver"));
    }
}
