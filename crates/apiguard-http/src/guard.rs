//! Hawk realm guard middleware.
//!
//! Authenticates every request before it reaches the handler, stores the
//! resulting [`Identity`] in the request extensions, and signs the response
//! with `Server-Authorization` when configured to.

use std::sync::Arc;

use apiguard_core::ApiError;
use apiguard_hawk::{AuthEngine, Identity, RequestContext, SERVER_AUTHORIZATION};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use tracing::debug;

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::responder::Responder;

/// Middleware enforcing Hawk authentication.
#[derive(Debug, Clone)]
pub struct HawkGuard {
    engine: Arc<AuthEngine>,
    responder: Arc<Responder>,
}

impl HawkGuard {
    /// Guard requests with `engine`, rendering rejections with `responder`.
    #[must_use]
    pub fn new(engine: Arc<AuthEngine>, responder: Arc<Responder>) -> Self {
        Self { engine, responder }
    }

    fn authenticate(&self, req: &http::Request<Bytes>) -> Result<Identity, ApiError> {
        let decision = self
            .engine
            .authenticate(&RequestContext::from_request(req))?;
        decision.into_result()
    }
}

/// What response signing needs to know about the request.
struct SignedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    identity: Identity,
}

impl SignedRequest {
    fn context(&self) -> RequestContext<'_> {
        RequestContext {
            method: &self.method,
            uri: &self.uri,
            headers: &self.headers,
            body: &self.body,
        }
    }
}

impl Middleware for HawkGuard {
    fn call<'a>(
        &'a self,
        mut req: http::Request<Bytes>,
        next: Next<'a>,
    ) -> BoxFuture<'a, http::Response<Bytes>> {
        Box::pin(async move {
            let identity = match self.authenticate(&req) {
                Ok(identity) => identity,
                Err(err) => return self.responder.render_error(req.headers(), &err),
            };
            debug!(client_id = %identity.client_id, "request admitted");

            let signing = self.engine.options().sign_responses.then(|| SignedRequest {
                method: req.method().clone(),
                uri: req.uri().clone(),
                headers: req.headers().clone(),
                body: req.body().clone(),
                identity: identity.clone(),
            });
            req.extensions_mut().insert(identity);

            let mut response = next.run(req).await;

            if let Some(signing) = signing {
                let content_type = response
                    .headers()
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                let header = self.engine.sign_response(
                    &signing.context(),
                    Some(&signing.identity),
                    response.body(),
                    &content_type,
                );
                if let Some(value) = header.and_then(|h| HeaderValue::from_str(&h).ok()) {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static(SERVER_AUTHORIZATION), value);
                }
            }

            response
        })
    }
}

