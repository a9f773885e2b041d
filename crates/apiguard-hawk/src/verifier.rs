//! MAC verification pipeline.
//!
//! Gates run in a fixed order and stop at the first failure:
//!
//! 1. parse the `Authorization` header and the request target;
//! 2. resolve the client's credentials;
//! 3. check the timestamp against the server clock plus offset;
//! 4. reject an `(id, nonce)` pair that is still live;
//! 5. verify the payload hash, if one was sent;
//! 6. verify the MAC, then record the nonce.
//!
//! The nonce is recorded only once the MAC has verified, so a forged request
//! cannot consume a nonce it does not own. Recording is an atomic
//! check-and-insert: of two concurrent requests with the same pair, the second
//! still fails with `nonce already used`.
//!
//! All secret comparisons are constant time, and no computed value ever
//! reaches an error message.

use std::sync::Arc;

use http::{HeaderMap, Method, Request, Uri};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{CanonicalRequest, MacType, RequestTarget, payload_hash};
use crate::clock::Clock;
use crate::config::HawkOptions;
use crate::credentials::{CredentialResolver, HawkCredentials};
use crate::error::AuthError;
use crate::header::HawkHeader;
use crate::nonce::NonceStore;

/// Borrowed view of an incoming request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Request method.
    pub method: &'a Method,
    /// Request URI as received.
    pub uri: &'a Uri,
    /// Request headers.
    pub headers: &'a HeaderMap,
    /// Full request body.
    pub body: &'a [u8],
}

impl<'a> RequestContext<'a> {
    /// View a request split into parts and body.
    #[must_use]
    pub fn new(parts: &'a http::request::Parts, body: &'a [u8]) -> Self {
        Self {
            method: &parts.method,
            uri: &parts.uri,
            headers: &parts.headers,
            body,
        }
    }

    /// View a buffered request.
    #[must_use]
    pub fn from_request<B: AsRef<[u8]>>(request: &'a Request<B>) -> Self {
        Self {
            method: request.method(),
            uri: request.uri(),
            headers: request.headers(),
            body: request.body().as_ref(),
        }
    }

    /// The raw `Authorization` header, if present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHeader`] when the value is not visible ASCII.
    pub fn authorization(&self) -> Result<Option<&'a str>, AuthError> {
        self.headers
            .get(http::header::AUTHORIZATION)
            .map(|v| {
                v.to_str()
                    .map_err(|_| AuthError::MalformedHeader("non-ASCII value".to_owned()))
            })
            .transpose()
    }

    /// The `Content-Type` header, empty when absent.
    #[must_use]
    pub fn content_type(&self) -> &'a str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// A request whose MAC has been verified.
#[derive(Debug, Clone)]
pub struct VerifiedRequest {
    /// The resolved credentials.
    pub credentials: HawkCredentials,
    /// The parsed `Authorization` header.
    pub header: HawkHeader,
    /// The target the MAC covered.
    pub target: RequestTarget,
    /// The request timestamp.
    pub timestamp: i64,
}

impl VerifiedRequest {
    /// The authenticated client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.credentials.id
    }
}

/// Verifies Hawk request MACs.
#[derive(Debug, Clone)]
pub struct MacVerifier {
    options: HawkOptions,
    clock: Arc<dyn Clock>,
    nonces: Arc<NonceStore>,
}

impl MacVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(options: HawkOptions, clock: Arc<dyn Clock>, nonces: Arc<NonceStore>) -> Self {
        Self {
            options,
            clock,
            nonces,
        }
    }

    /// The nonce store shared by this verifier.
    #[must_use]
    pub fn nonce_store(&self) -> &Arc<NonceStore> {
        &self.nonces
    }

    /// Verify a request and record its nonce.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first gate that fails.
    pub fn verify(
        &self,
        ctx: &RequestContext<'_>,
        resolver: &dyn CredentialResolver,
    ) -> Result<VerifiedRequest, AuthError> {
        self.run(ctx, resolver, true)
    }

    /// Verify a request without touching the nonce store.
    ///
    /// Used to re-establish credentials for response signing when the request
    /// was admitted without a MAC check.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first gate that fails.
    pub fn check(
        &self,
        ctx: &RequestContext<'_>,
        resolver: &dyn CredentialResolver,
    ) -> Result<VerifiedRequest, AuthError> {
        self.run(ctx, resolver, false)
    }

    fn run(
        &self,
        ctx: &RequestContext<'_>,
        resolver: &dyn CredentialResolver,
        record_nonce: bool,
    ) -> Result<VerifiedRequest, AuthError> {
        let raw = ctx.authorization()?.ok_or(AuthError::MissingAuthorization)?;
        let header: HawkHeader = raw.parse()?;
        let id = HawkHeader::require(&header.id, "id")?;
        let ts = HawkHeader::require(&header.ts, "ts")?;
        let nonce = HawkHeader::require(&header.nonce, "nonce")?;
        let mac = HawkHeader::require(&header.mac, "mac")?;
        let target =
            RequestTarget::from_request(ctx.method, ctx.uri, ctx.headers, &self.options.default_scheme)?;

        debug!(client_id = %id, "verifying Hawk MAC");

        let credentials = resolver.resolve(id)?;

        let timestamp: i64 = ts.parse().map_err(|_| AuthError::InvalidTimestamp)?;
        let now = self
            .clock
            .now()
            .saturating_add(self.options.localtime_offset_secs);
        let skew = self.options.timestamp_skew_secs;
        if now.abs_diff(timestamp) > skew.unsigned_abs() {
            debug!(client_id = %id, timestamp, now, "timestamp outside skew window");
            return Err(AuthError::StaleTimestamp);
        }

        if record_nonce && self.nonces.is_live(id, nonce, now) {
            return Err(AuthError::NonceReused);
        }

        match header.hash.as_deref() {
            Some(presented) => {
                let expected =
                    payload_hash(credentials.algorithm, ctx.body, ctx.content_type());
                if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
                    return Err(AuthError::PayloadHashMismatch);
                }
            }
            None if self.options.accept_untrusted_content => {
                debug!(client_id = %id, "accepting request without payload hash");
            }
            None => return Err(AuthError::MissingPayloadHash),
        }

        let expected_mac = CanonicalRequest {
            mac_type: MacType::Header,
            ts,
            nonce,
            target: &target,
            hash: header.hash.as_deref(),
            ext: header.ext.as_deref(),
            app: header.app.as_deref(),
            dlg: header.dlg.as_deref(),
        }
        .mac(&credentials);
        if !bool::from(mac.as_bytes().ct_eq(expected_mac.as_bytes())) {
            return Err(AuthError::MacMismatch);
        }

        if record_nonce && !self.nonces.check_and_insert(id, nonce, timestamp, skew, now) {
            debug!(client_id = %id, "lost race for nonce");
            return Err(AuthError::NonceReused);
        }

        debug!(client_id = %id, "Hawk MAC verified");
        Ok(VerifiedRequest {
            credentials,
            header,
            target,
            timestamp,
        })
    }
}
