//! Handler trait: the boundary between the HTTP pipeline and application logic.

use std::future::Future;
use std::pin::Pin;

use apiguard_core::ApiError;
use bytes::Bytes;

use crate::output::HandlerOutput;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait that the application must implement.
///
/// The handler receives the buffered request, including any
/// [`Identity`](apiguard_hawk::Identity) the guard stored in its extensions,
/// and returns output for the responder to render.
pub trait ApiHandler: Send + Sync + 'static {
    /// Handle a request.
    fn handle(
        &self,
        req: http::Request<Bytes>,
    ) -> BoxFuture<'static, Result<HandlerOutput, ApiError>>;
}

/// An [`ApiHandler`] backed by an async function.
#[derive(Debug, Clone)]
pub struct FnHandler<F>(F);

/// Wrap an async function as an [`ApiHandler`].
///
/// ```
/// use apiguard_http::{HandlerOutput, handler_fn};
///
/// let handler = handler_fn(|_req| async {
///     Ok(HandlerOutput::payload(serde_json::json!({"hello": "world"})))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutput, ApiError>> + Send + 'static,
{
    FnHandler(f)
}

impl<F, Fut> ApiHandler for FnHandler<F>
where
    F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutput, ApiError>> + Send + 'static,
{
    fn handle(
        &self,
        req: http::Request<Bytes>,
    ) -> BoxFuture<'static, Result<HandlerOutput, ApiError>> {
        Box::pin((self.0)(req))
    }
}
