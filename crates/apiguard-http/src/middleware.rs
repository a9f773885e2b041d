//! `(request, next) -> response` middleware chain.
//!
//! Middleware run in registration order around the endpoint:
//!
//! ```text
//! m1 -> m2 -> ... -> endpoint (handler + responder)
//! ```
//!
//! A middleware may answer on its own without calling [`Next::run`], or call
//! it and post-process the response.

use std::sync::Arc;

use bytes::Bytes;

use crate::handler::BoxFuture;

/// A step in the request pipeline.
pub trait Middleware: Send + Sync + 'static {
    /// Process `req`, usually by delegating to `next`.
    fn call<'a>(
        &'a self,
        req: http::Request<Bytes>,
        next: Next<'a>,
    ) -> BoxFuture<'a, http::Response<Bytes>>;
}

/// The end of the chain.
pub(crate) trait Endpoint: Send + Sync {
    fn call<'a>(&'a self, req: http::Request<Bytes>) -> BoxFuture<'a, http::Response<Bytes>>;
}

/// The remainder of the middleware chain.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub(crate) fn new(middlewares: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Endpoint) -> Self {
        Self {
            middlewares,
            endpoint,
        }
    }

    /// Run the rest of the chain.
    pub fn run(self, req: http::Request<Bytes>) -> BoxFuture<'a, http::Response<Bytes>> {
        match self.middlewares.split_first() {
            Some((first, rest)) => first.call(req, Next::new(rest, self.endpoint)),
            None => self.endpoint.call(req),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}
