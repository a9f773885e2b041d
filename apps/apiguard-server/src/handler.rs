//! Demo application handler.

use apiguard_core::ApiError;
use apiguard_hawk::Identity;
use apiguard_http::{ApiHandler, BoxFuture, HandlerOutput};
use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::{Value, json};

/// Serves a handful of demo endpoints:
///
/// | Route | Response |
/// |-------|----------|
/// | `GET /` | `{"hello": "world", "client": <id>}` |
/// | `POST /echo` | the JSON request body |
/// | `GET /html` | a raw HTML page, not negotiated |
#[derive(Debug, Clone, Default)]
pub struct DemoHandler;

impl ApiHandler for DemoHandler {
    fn handle(
        &self,
        req: http::Request<Bytes>,
    ) -> BoxFuture<'static, Result<HandlerOutput, ApiError>> {
        Box::pin(async move { route(&req) })
    }
}

fn route(req: &http::Request<Bytes>) -> Result<HandlerOutput, ApiError> {
    let client = req
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.client_id.clone());

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => Ok(HandlerOutput::payload(json!({
            "hello": "world",
            "client": client,
        }))),
        (&Method::POST, "/echo") => {
            let value: Value = serde_json::from_slice(req.body())
                .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;
            Ok(HandlerOutput::payload(value).with_status(StatusCode::CREATED))
        }
        (&Method::GET, "/html") => Ok(HandlerOutput::raw("<h1>Hello, world!</h1>")),
        (_, path) => Ok(HandlerOutput::payload(json!({ "error": "not found", "path": path }))
            .with_status(StatusCode::NOT_FOUND)),
    }
}
