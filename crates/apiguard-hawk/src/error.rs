//! Error types for Hawk authentication.
//!
//! Request-level failures are [`AuthError`]s. Each maps onto a
//! [`RejectionKind`] that decides the HTTP status, and renders a message that
//! is safe to return to the client: computed MACs and hashes never appear in
//! it. A missing credential resolver is a [`ConfigurationError`] instead and is
//! never reported as an authentication failure.

use apiguard_core::{ApiError, ErrorKind};

/// How a rejected request is reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// 401: the request is well formed but its credentials are not acceptable.
    Unauthorized,
    /// 400: the request is malformed.
    BadRequest,
}

impl From<RejectionKind> for ErrorKind {
    fn from(kind: RejectionKind) -> Self {
        match kind {
            RejectionKind::Unauthorized => Self::Unauthorized,
            RejectionKind::BadRequest => Self::BadRequest,
        }
    }
}

/// Errors that can occur while authenticating a Hawk request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header was sent.
    #[error("missing Authorization header")]
    MissingAuthorization,

    /// The header does not use the Hawk scheme.
    #[error("unknown scheme: {0}")]
    UnknownScheme(String),

    /// The header could not be parsed.
    #[error("malformed Authorization header: {0}")]
    MalformedHeader(String),

    /// A required header attribute is absent.
    #[error("missing attribute: {0}")]
    MissingAttribute(&'static str),

    /// The request target has no host.
    #[error("missing host")]
    MissingHost,

    /// No credentials exist for the presented client id.
    #[error("could not find credentials for ID {0}")]
    CredentialsNotFound(String),

    /// The timestamp is not an integer.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// The timestamp is outside the accepted skew window.
    #[error("stale timestamp")]
    StaleTimestamp,

    /// The `(id, nonce)` pair was already seen inside the skew window.
    #[error("nonce already used")]
    NonceReused,

    /// The request has no payload hash and untrusted content is not accepted.
    #[error("missing payload hash")]
    MissingPayloadHash,

    /// The presented payload hash does not match the body.
    #[error("payload hash mismatch")]
    PayloadHashMismatch,

    /// The presented MAC does not match.
    #[error("MAC mismatch")]
    MacMismatch,

    /// A session is present but does not belong to an authenticated user.
    #[error("session is not authenticated")]
    SessionNotAuthenticated,

    /// A client was asked to sign a URL it cannot parse.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl AuthError {
    /// The status class this error is reported with.
    #[must_use]
    pub fn rejection_kind(&self) -> RejectionKind {
        match self {
            Self::UnknownScheme(_)
            | Self::MalformedHeader(_)
            | Self::MissingAttribute(_)
            | Self::MissingHost
            | Self::InvalidUrl(_)
            | Self::MissingPayloadHash
            | Self::PayloadHashMismatch => RejectionKind::BadRequest,
            Self::MissingAuthorization
            | Self::CredentialsNotFound(_)
            | Self::InvalidTimestamp
            | Self::StaleTimestamp
            | Self::NonceReused
            | Self::MacMismatch
            | Self::SessionNotAuthenticated => RejectionKind::Unauthorized,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::with_detail(err.rejection_kind().into(), err.to_string())
    }
}

/// Fatal misconfiguration of the authentication engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Signature mode was reached without a registered key loader.
    #[error("no credential resolver registered for Hawk authentication")]
    MissingResolver,
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        Self::configuration(err.to_string())
    }
}
