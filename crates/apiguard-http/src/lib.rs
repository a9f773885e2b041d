//! Hyper hosting layer for apiguard.
//!
//! This crate wires the negotiation and authentication engines into a request
//! pipeline:
//!
//! - **Handler trait**: the boundary between HTTP and application logic
//! - **Middleware**: `(request, next) -> response` chain, with [`HawkGuard`]
//!   authenticating requests and signing responses
//! - **Responder**: content negotiation of handler output and errors
//! - **Service**: Hyper `Service` implementation running the chain

pub mod body;
pub mod guard;
pub mod handler;
pub mod middleware;
pub mod output;
pub mod responder;
pub mod service;

pub use body::ApiBody;
pub use guard::HawkGuard;
pub use handler::{ApiHandler, BoxFuture, FnHandler, handler_fn};
pub use middleware::{Middleware, Next};
pub use output::HandlerOutput;
pub use responder::Responder;
pub use service::{ApiHttpConfig, ApiHttpService};
