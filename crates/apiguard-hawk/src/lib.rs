//! Hawk MAC request authentication for apiguard.
//!
//! This crate implements the server side of the Hawk HTTP authentication
//! scheme: parsing the `Authorization` header, resolving the client's shared
//! key, enforcing timestamp freshness and nonce uniqueness, verifying the
//! payload hash and the request MAC, and signing responses with a
//! `Server-Authorization` header. A client-side [`Sender`] produces matching
//! headers for tests and API clients.
//!
//! # Usage
//!
//! ```rust
//! use apiguard_hawk::{AuthDecision, AuthEngine, HawkOptions, RequestContext, StaticKeyLoader};
//!
//! let engine = AuthEngine::builder(HawkOptions::default())
//!     .key_loader(StaticKeyLoader::new([("Alice", "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn")]))
//!     .build();
//!
//! let request = http::Request::builder().uri("http://localhost/").body(Vec::new()).unwrap();
//! let decision = engine.authenticate(&RequestContext::from_request(&request)).unwrap();
//! assert!(matches!(decision, AuthDecision::Rejected { .. }));
//! ```
//!
//! # Modules
//!
//! - [`algorithm`] - Hash and HMAC algorithms
//! - [`canonical`] - Normalized request strings and payload hashes
//! - [`clock`] - Time source abstraction
//! - [`config`] - Hawk options loaded from the environment
//! - [`credentials`] - Credential resolution from host-supplied key loaders
//! - [`engine`] - The per-request authentication state machine
//! - [`error`] - Authentication and configuration error types
//! - [`header`] - Hawk header wire format
//! - [`nonce`] - Replay protection store
//! - [`sender`] - Client-side request signing and response verification
//! - [`session`] - Cookie/session fallback authentication
//! - [`signer`] - `Server-Authorization` response signing
//! - [`verifier`] - MAC verification pipeline

pub mod algorithm;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod header;
pub mod nonce;
pub mod sender;
pub mod session;
pub mod signer;
pub mod verifier;

pub use algorithm::Algorithm;
pub use canonical::{CanonicalRequest, MacType, RequestTarget, payload_hash};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::HawkOptions;
pub use credentials::{
    CredentialResolver, HawkCredentials, KeyLoader, KeyLoaderResolver, LookupError,
    StaticKeyLoader,
};
pub use engine::{ANONYMOUS, AuthDecision, AuthEngine, AuthEngineBuilder, AuthMethod, Identity};
pub use error::{AuthError, ConfigurationError, RejectionKind};
pub use header::HawkHeader;
pub use nonce::{NonceRecord, NonceStore};
pub use sender::{Sender, SenderBuilder};
pub use session::{CookieSessions, SessionAuthenticator};
pub use signer::{SERVER_AUTHORIZATION, server_authorization};
pub use verifier::{MacVerifier, RequestContext, VerifiedRequest};
