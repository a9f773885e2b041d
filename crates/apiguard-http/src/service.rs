//! Hyper `Service` running the apiguard pipeline.
//!
//! The pipeline works on buffered `http::Request<Bytes>` /
//! `http::Response<Bytes>` values; the incoming body is collected and the
//! outgoing body wrapped only at the hyper edge. [`ApiHttpService::handle`]
//! runs the same pipeline without a connection, which is what tests use.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use apiguard_core::ApiError;
use apiguard_hawk::AuthEngine;
use apiguard_negotiation::FormatterRegistry;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use tracing::debug;

use crate::body::ApiBody;
use crate::guard::HawkGuard;
use crate::handler::{ApiHandler, BoxFuture};
use crate::middleware::{Endpoint, Middleware, Next};
use crate::responder::Responder;

/// Configuration for the HTTP service.
#[derive(Clone)]
pub struct ApiHttpConfig {
    /// Formatters used for payloads and errors.
    pub registry: Arc<FormatterRegistry>,
    /// Render errors as negotiated `{"code", "message"}` payloads.
    pub structured_errors: bool,
    /// Authentication engine; requests are not guarded without one.
    pub auth: Option<Arc<AuthEngine>>,
}

impl std::fmt::Debug for ApiHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHttpConfig")
            .field("registry", &self.registry)
            .field("structured_errors", &self.structured_errors)
            .field("auth", &self.auth.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Hyper `Service` implementation wrapping an [`ApiHandler`].
pub struct ApiHttpService<H: ApiHandler> {
    endpoint: Arc<HandlerEndpoint<H>>,
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl<H: ApiHandler> ApiHttpService<H> {
    /// Create a service. With an authentication engine configured, a
    /// [`HawkGuard`] is installed as the outermost middleware.
    pub fn new(handler: Arc<H>, config: ApiHttpConfig) -> Self {
        let responder = Arc::new(Responder::new(config.registry, config.structured_errors));
        let mut middlewares: Vec<Arc<dyn Middleware>> = Vec::new();
        if let Some(engine) = config.auth {
            middlewares.push(Arc::new(HawkGuard::new(engine, Arc::clone(&responder))));
        }
        Self {
            endpoint: Arc::new(HandlerEndpoint { handler, responder }),
            middlewares: Arc::new(middlewares),
        }
    }

    /// Append a middleware; it runs after those already installed.
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        Arc::make_mut(&mut self.middlewares).push(Arc::new(middleware));
        self
    }

    /// The responder rendering this service's output.
    #[must_use]
    pub fn responder(&self) -> &Responder {
        &self.endpoint.responder
    }

    /// Run a buffered request through the middleware chain and handler.
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<Bytes> {
        Next::new(&self.middlewares, self.endpoint.as_ref())
            .run(req)
            .await
    }
}

impl<H: ApiHandler> Clone for ApiHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            middlewares: Arc::clone(&self.middlewares),
        }
    }
}

impl<H: ApiHandler> std::fmt::Debug for ApiHttpService<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHttpService")
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl<H: ApiHandler> hyper::service::Service<http::Request<Incoming>> for ApiHttpService<H> {
    type Response = http::Response<ApiBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            debug!(request_id = %request_id, method = %parts.method, uri = %parts.uri, "handling request");

            let response = match collect_body(incoming).await {
                Ok(body) => service.handle(http::Request::from_parts(parts, body)).await,
                Err(err) => service.responder().render_error(&parts.headers, &err),
            };
            let response = add_common_headers(response, &request_id);
            Ok(response.map(ApiBody::from_bytes))
        })
    }
}

/// The end of the chain: run the handler and render its result.
struct HandlerEndpoint<H> {
    handler: Arc<H>,
    responder: Arc<Responder>,
}

impl<H: ApiHandler> Endpoint for HandlerEndpoint<H> {
    fn call<'a>(&'a self, req: http::Request<Bytes>) -> BoxFuture<'a, http::Response<Bytes>> {
        Box::pin(async move {
            let headers = req.headers().clone();
            let result = self.handler.handle(req).await;
            self.responder.render(&headers, result)
        })
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body(incoming: Incoming) -> Result<Bytes, ApiError> {
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| ApiError::bad_request(format!("failed to read request body: {e}")))
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<Bytes>,
    request_id: &str,
) -> http::Response<Bytes> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }
    headers.insert("server", http::HeaderValue::from_static("apiguard"));

    response
}
