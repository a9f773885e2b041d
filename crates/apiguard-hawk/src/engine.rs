//! The per-request authentication state machine.
//!
//! ```text
//! enabled?  -- no -->  Authenticated(anonymous)
//!    | yes
//! cookie auth allowed and session present?  -- yes -->  session check
//!    | no
//! resolver registered?  -- no -->  ConfigurationError
//!    | yes
//! MAC verification  -->  Authenticated(client) | Rejected(kind, reason)
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use apiguard_core::ApiError;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::HawkOptions;
use crate::credentials::{CredentialResolver, KeyLoader, KeyLoaderResolver};
use crate::error::{AuthError, ConfigurationError, RejectionKind};
use crate::nonce::NonceStore;
use crate::session::SessionAuthenticator;
use crate::signer::server_authorization;
use crate::verifier::{MacVerifier, RequestContext, VerifiedRequest};

/// Client id reported when authentication is disabled.
pub const ANONYMOUS: &str = "anonymous";

/// How a request was admitted.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Authentication is disabled.
    Anonymous,
    /// An authenticated session.
    Session,
    /// A verified Hawk MAC.
    Signature(Box<VerifiedRequest>),
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Client id, user id, or [`ANONYMOUS`].
    pub client_id: String,
    /// How the caller was authenticated.
    pub method: AuthMethod,
}

/// Outcome of authenticating one request.
#[derive(Debug, Clone)]
pub enum AuthDecision {
    /// The request may proceed.
    Authenticated(Identity),
    /// The request must be refused.
    Rejected {
        /// Status class of the refusal.
        kind: RejectionKind,
        /// Client-facing reason.
        reason: String,
    },
}

impl AuthDecision {
    /// Convert into the admitted identity or the error to respond with.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] carrying the rejection's status and reason.
    pub fn into_result(self) -> Result<Identity, ApiError> {
        match self {
            Self::Authenticated(identity) => Ok(identity),
            Self::Rejected { kind, reason } => Err(ApiError::with_detail(kind.into(), reason)),
        }
    }
}

impl From<AuthError> for AuthDecision {
    fn from(err: AuthError) -> Self {
        Self::Rejected {
            kind: err.rejection_kind(),
            reason: err.to_string(),
        }
    }
}

/// Authenticates requests and signs responses.
pub struct AuthEngine {
    options: HawkOptions,
    resolver: Option<Arc<dyn CredentialResolver>>,
    sessions: Option<Arc<dyn SessionAuthenticator>>,
    verifier: MacVerifier,
}

impl std::fmt::Debug for AuthEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEngine")
            .field("options", &self.options)
            .field("has_resolver", &self.resolver.is_some())
            .field("has_sessions", &self.sessions.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthEngine {
    /// Start building an engine.
    #[must_use]
    pub fn builder(options: HawkOptions) -> AuthEngineBuilder {
        AuthEngineBuilder {
            options,
            resolver: None,
            sessions: None,
            clock: None,
            nonces: None,
        }
    }

    /// The engine's options.
    #[must_use]
    pub fn options(&self) -> &HawkOptions {
        &self.options
    }

    /// The nonce store shared with the verifier.
    #[must_use]
    pub fn nonce_store(&self) -> &Arc<NonceStore> {
        self.verifier.nonce_store()
    }

    /// Check that signature mode can run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingResolver`] when authentication is
    /// enabled but no key loader was registered.
    pub fn ensure_configured(&self) -> Result<(), ConfigurationError> {
        if self.options.enabled && self.resolver.is_none() {
            return Err(ConfigurationError::MissingResolver);
        }
        Ok(())
    }

    /// Decide whether a request may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when signature mode is reached without a
    /// registered resolver. This is never reported as an authentication failure.
    pub fn authenticate(&self, ctx: &RequestContext<'_>) -> Result<AuthDecision, ConfigurationError> {
        if !self.options.enabled {
            return Ok(AuthDecision::Authenticated(Identity {
                client_id: ANONYMOUS.to_owned(),
                method: AuthMethod::Anonymous,
            }));
        }

        let sessions = self
            .sessions
            .as_deref()
            .filter(|_| self.options.allow_cookie_auth);
        if let Some(sessions) = sessions.filter(|s| s.has_session(ctx)) {
            return Ok(match sessions.authenticated_user(ctx) {
                Some(user) => {
                    debug!(user = %user, "authenticated by session");
                    AuthDecision::Authenticated(Identity {
                        client_id: user,
                        method: AuthMethod::Session,
                    })
                }
                None => {
                    warn!("rejected request with unauthenticated session");
                    AuthError::SessionNotAuthenticated.into()
                }
            });
        }

        let Some(resolver) = self.resolver.as_deref() else {
            error!("Hawk authentication is enabled but no key loader is registered");
            return Err(ConfigurationError::MissingResolver);
        };

        Ok(match self.verifier.verify(ctx, resolver) {
            Ok(verified) => AuthDecision::Authenticated(Identity {
                client_id: verified.client_id().to_owned(),
                method: AuthMethod::Signature(Box::new(verified)),
            }),
            Err(err) => {
                warn!(error = %err, method = %ctx.method, uri = %ctx.uri, "rejected Hawk request");
                err.into()
            }
        })
    }

    /// Compute a `Server-Authorization` value for a response, when possible.
    ///
    /// Returns `None` when signing is off, when the request carries no Hawk
    /// header, or when its credentials cannot be re-established. A request
    /// admitted by MAC reuses its verification; any other request is checked
    /// again without recording its nonce.
    #[must_use]
    pub fn sign_response(
        &self,
        ctx: &RequestContext<'_>,
        identity: Option<&Identity>,
        body: &[u8],
        content_type: &str,
    ) -> Option<String> {
        if !self.options.sign_responses {
            return None;
        }

        let verified = match identity.map(|i| &i.method) {
            Some(AuthMethod::Signature(verified)) => Cow::Borrowed(verified.as_ref()),
            _ => {
                ctx.authorization().ok().flatten()?;
                let resolver = self.resolver.as_deref()?;
                match self.verifier.check(ctx, resolver) {
                    Ok(verified) => Cow::Owned(verified),
                    Err(err) => {
                        debug!(error = %err, "skipping response signature");
                        return None;
                    }
                }
            }
        };

        Some(server_authorization(&verified, body, content_type, None))
    }
}

/// Builder for [`AuthEngine`].
pub struct AuthEngineBuilder {
    options: HawkOptions,
    resolver: Option<Arc<dyn CredentialResolver>>,
    sessions: Option<Arc<dyn SessionAuthenticator>>,
    clock: Option<Arc<dyn Clock>>,
    nonces: Option<Arc<NonceStore>>,
}

impl AuthEngineBuilder {
    /// Register a key loader; resolved credentials use the configured algorithm.
    #[must_use]
    pub fn key_loader<L: KeyLoader + 'static>(self, loader: L) -> Self {
        let algorithm = self.options.algorithm;
        self.resolver(KeyLoaderResolver::new(loader, algorithm))
    }

    /// Register a full credential resolver.
    #[must_use]
    pub fn resolver<R: CredentialResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Register the session layer consulted in cookie mode.
    #[must_use]
    pub fn session_authenticator(mut self, sessions: Arc<dyn SessionAuthenticator>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Replace the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing nonce store.
    #[must_use]
    pub fn nonce_store(mut self, nonces: Arc<NonceStore>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Build the engine.
    #[must_use]
    pub fn build(self) -> AuthEngine {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let nonces = self
            .nonces
            .unwrap_or_else(|| Arc::new(NonceStore::new(self.options.timestamp_skew_secs)));
        AuthEngine {
            verifier: MacVerifier::new(self.options.clone(), clock, nonces),
            options: self.options,
            resolver: self.resolver,
            sessions: self.sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::algorithm::Algorithm;
    use crate::clock::FixedClock;
    use crate::credentials::{HawkCredentials, StaticKeyLoader};
    use crate::sender::Sender;
    use crate::session::CookieSessions;

    const NOW: i64 = 1_700_000_000;
    const ALICE_KEY: &str = "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn";
    const URL: &str = "http://localhost:5000/";
    const BODY: &str = r#"{"hello": "world"}"#;

    fn alice() -> HawkCredentials {
        HawkCredentials::new("Alice", ALICE_KEY, Algorithm::Sha256)
    }

    fn engine_with(options: HawkOptions, clock: Arc<FixedClock>) -> AuthEngine {
        AuthEngine::builder(options)
            .key_loader(StaticKeyLoader::new([("Alice", ALICE_KEY)]))
            .clock(clock)
            .build()
    }

    fn engine() -> AuthEngine {
        engine_with(HawkOptions::default(), Arc::new(FixedClock::new(NOW)))
    }

    fn signed(sender: &Sender, body: &str) -> http::Request<Vec<u8>> {
        signed_with(&sender.request_header(), body)
    }

    fn signed_with(authorization: &str, body: &str) -> http::Request<Vec<u8>> {
        http::Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(http::header::HOST, "localhost:5000")
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::AUTHORIZATION, authorization)
            .body(body.as_bytes().to_vec())
            .unwrap()
    }

    fn sender_at(ts: i64) -> Sender {
        Sender::builder(alice(), Method::POST, URL)
            .body(BODY, "application/json")
            .timestamp(ts)
            .build()
            .unwrap()
    }

    fn with_authorization(value: &str) -> http::Request<Vec<u8>> {
        http::Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(http::header::HOST, "localhost:5000")
            .header(http::header::AUTHORIZATION, value)
            .body(Vec::new())
            .unwrap()
    }

    fn decide(engine: &AuthEngine, request: &http::Request<Vec<u8>>) -> AuthDecision {
        engine
            .authenticate(&RequestContext::from_request(request))
            .unwrap()
    }

    fn rejection(decision: AuthDecision) -> (RejectionKind, String) {
        match decision {
            AuthDecision::Rejected { kind, reason } => (kind, reason),
            AuthDecision::Authenticated(identity) => panic!("unexpectedly admitted {identity:?}"),
        }
    }

    #[test]
    fn test_should_admit_signed_request() {
        let engine = engine();
        let decision = decide(&engine, &signed(&sender_at(NOW), BODY));
        match decision {
            AuthDecision::Authenticated(identity) => {
                assert_eq!(identity.client_id, "Alice");
                assert!(matches!(identity.method, AuthMethod::Signature(_)));
            }
            other @ AuthDecision::Rejected { .. } => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_should_reject_missing_authorization() {
        let request = http::Request::builder()
            .uri("http://localhost:5000/")
            .body(Vec::new())
            .unwrap();
        let (kind, _) = rejection(decide(&engine(), &request));
        assert_eq!(kind, RejectionKind::Unauthorized);
    }

    #[test]
    fn test_should_reject_unknown_scheme_as_bad_request() {
        let (kind, reason) = rejection(decide(&engine(), &with_authorization("blah")));
        assert_eq!(kind, RejectionKind::BadRequest);
        assert_eq!(reason, "unknown scheme: blah");
    }

    #[test]
    fn test_should_reject_missing_mac_as_bad_request() {
        let header = format!(r#"Hawk id="Alice", ts="{NOW}", nonce="abc""#);
        let (kind, reason) = rejection(decide(&engine(), &with_authorization(&header)));
        assert_eq!(kind, RejectionKind::BadRequest);
        assert_eq!(reason, "missing attribute: mac");
    }

    #[test]
    fn test_should_reject_unknown_client() {
        let header = r#"Hawk mac="", hash="", id="Bob", ts="", nonce="""#;
        let (kind, reason) = rejection(decide(&engine(), &with_authorization(header)));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert_eq!(reason, "could not find credentials for ID Bob");
    }

    #[test]
    fn test_should_never_expose_computed_mac() {
        let header = r#"Hawk mac="", hash="", id="Alice", ts="", nonce="""#;
        let (kind, reason) = rejection(decide(&engine(), &with_authorization(header)));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert!(!reason.contains("ours"));

        let forged = format!(
            r#"Hawk id="Alice", ts="{NOW}", nonce="n1", mac="AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=""#
        );
        let options = HawkOptions {
            accept_untrusted_content: true,
            ..HawkOptions::default()
        };
        let engine = engine_with(options, Arc::new(FixedClock::new(NOW)));
        let (kind, reason) = rejection(decide(&engine, &with_authorization(&forged)));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert_eq!(reason, "MAC mismatch");
    }

    #[test]
    fn test_should_reject_replayed_request() {
        let engine = engine();
        let request = signed(&sender_at(NOW), BODY);

        assert!(matches!(decide(&engine, &request), AuthDecision::Authenticated(_)));
        let (kind, reason) = rejection(decide(&engine, &request));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert_eq!(reason, "nonce already used");
    }

    #[test]
    fn test_should_not_let_forged_request_consume_nonce() {
        let engine = engine();
        let sender = Sender::builder(alice(), Method::POST, URL)
            .body(BODY, "application/json")
            .timestamp(NOW)
            .nonce("observed")
            .build()
            .unwrap();

        let forged = format!(
            r#"Hawk id="Alice", ts="{NOW}", nonce="observed", hash="x", mac="x""#
        );
        let (kind, reason) = rejection(decide(&engine, &with_authorization(&forged)));
        assert_eq!(kind, RejectionKind::BadRequest);
        assert_eq!(reason, "payload hash mismatch");

        let forged_mac = format!(
            r#"Hawk id="Alice", ts="{NOW}", nonce="observed", hash="{}", mac="x""#,
            sender.header().hash.as_deref().unwrap()
        );
        let (kind, reason) = rejection(decide(&engine, &signed_with(&forged_mac, BODY)));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert_eq!(reason, "MAC mismatch");
        assert!(engine.nonce_store().is_empty());

        assert!(matches!(
            decide(&engine, &signed(&sender, BODY)),
            AuthDecision::Authenticated(_)
        ));
        assert!(!engine.nonce_store().is_empty());
    }

    #[test]
    fn test_should_accept_timestamp_exactly_at_skew_boundary() {
        let engine = engine();
        assert!(matches!(
            decide(&engine, &signed(&sender_at(NOW - 60), BODY)),
            AuthDecision::Authenticated(_)
        ));
        assert!(matches!(
            decide(&engine, &signed(&sender_at(NOW + 60), BODY)),
            AuthDecision::Authenticated(_)
        ));
    }

    #[test]
    fn test_should_reject_timestamp_past_skew_boundary() {
        let engine = engine();
        for ts in [NOW - 61, NOW + 61] {
            let (kind, reason) = rejection(decide(&engine, &signed(&sender_at(ts), BODY)));
            assert_eq!(kind, RejectionKind::Unauthorized);
            assert_eq!(reason, "stale timestamp");
        }
        assert!(engine.nonce_store().is_empty());
    }

    #[test]
    fn test_should_apply_localtime_offset() {
        let options = HawkOptions {
            localtime_offset_secs: 3600,
            ..HawkOptions::default()
        };
        let engine = engine_with(options, Arc::new(FixedClock::new(NOW)));
        assert!(matches!(
            decide(&engine, &signed(&sender_at(NOW + 3600), BODY)),
            AuthDecision::Authenticated(_)
        ));
    }

    #[test]
    fn test_should_reject_tampered_body_at_hash_gate() {
        let (kind, reason) = rejection(decide(
            &engine(),
            &signed(&sender_at(NOW), r#"{"hello": "mallory"}"#),
        ));
        assert_eq!(kind, RejectionKind::BadRequest);
        assert_eq!(reason, "payload hash mismatch");
    }

    #[test]
    fn test_should_require_payload_hash_unless_untrusted_content_accepted() {
        let sender = Sender::builder(alice(), Method::POST, URL)
            .body(BODY, "application/json")
            .timestamp(NOW)
            .without_payload_hash()
            .build()
            .unwrap();
        let request = signed(&sender, BODY);

        let (kind, reason) = rejection(decide(&engine(), &request));
        assert_eq!(kind, RejectionKind::BadRequest);
        assert_eq!(reason, "missing payload hash");

        let options = HawkOptions {
            accept_untrusted_content: true,
            ..HawkOptions::default()
        };
        let engine = engine_with(options, Arc::new(FixedClock::new(NOW)));
        assert!(matches!(decide(&engine, &request), AuthDecision::Authenticated(_)));
    }

    #[test]
    fn test_should_reject_mac_over_other_target() {
        let sender = Sender::builder(alice(), Method::POST, "http://localhost:5000/other")
            .body(BODY, "application/json")
            .timestamp(NOW)
            .build()
            .unwrap();
        let (kind, reason) = rejection(decide(&engine(), &signed(&sender, BODY)));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert_eq!(reason, "MAC mismatch");
    }

    #[test]
    fn test_should_admit_everything_when_disabled() {
        let options = HawkOptions {
            enabled: false,
            ..HawkOptions::default()
        };
        let engine = AuthEngine::builder(options).build();
        assert!(engine.ensure_configured().is_ok());

        let decision = decide(&engine, &with_authorization("blah"));
        match decision {
            AuthDecision::Authenticated(identity) => assert_eq!(identity.client_id, ANONYMOUS),
            other @ AuthDecision::Rejected { .. } => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_should_fail_fatally_without_resolver() {
        let engine = AuthEngine::builder(HawkOptions::default()).build();
        assert_eq!(
            engine.ensure_configured(),
            Err(ConfigurationError::MissingResolver)
        );
        let request = signed(&sender_at(NOW), BODY);
        assert_eq!(
            engine
                .authenticate(&RequestContext::from_request(&request))
                .unwrap_err(),
            ConfigurationError::MissingResolver
        );
    }

    #[test]
    fn test_should_authenticate_by_session_when_allowed() {
        let sessions = Arc::new(CookieSessions::new("session"));
        sessions.login("s1", "alice");
        let options = HawkOptions {
            allow_cookie_auth: true,
            ..HawkOptions::default()
        };
        let engine = AuthEngine::builder(options)
            .key_loader(StaticKeyLoader::new([("Alice", ALICE_KEY)]))
            .session_authenticator(sessions)
            .build();

        let cookie = |value: &str| {
            http::Request::builder()
                .uri("http://localhost:5000/")
                .header(http::header::COOKIE, value)
                .body(Vec::new())
                .unwrap()
        };

        match decide(&engine, &cookie("session=s1")) {
            AuthDecision::Authenticated(identity) => {
                assert_eq!(identity.client_id, "alice");
                assert!(matches!(identity.method, AuthMethod::Session));
            }
            other @ AuthDecision::Rejected { .. } => panic!("unexpected {other:?}"),
        }

        let (kind, reason) = rejection(decide(&engine, &cookie("session=unknown")));
        assert_eq!(kind, RejectionKind::Unauthorized);
        assert_eq!(reason, "session is not authenticated");

        // No session: falls through to signature mode.
        let (kind, _) = rejection(decide(&engine, &cookie("theme=dark")));
        assert_eq!(kind, RejectionKind::Unauthorized);
    }

    #[test]
    fn test_should_ignore_sessions_when_cookie_auth_disallowed() {
        let sessions = Arc::new(CookieSessions::new("session"));
        sessions.login("s1", "alice");
        let engine = AuthEngine::builder(HawkOptions::default())
            .key_loader(StaticKeyLoader::new([("Alice", ALICE_KEY)]))
            .session_authenticator(sessions)
            .build();

        let request = http::Request::builder()
            .uri("http://localhost:5000/")
            .header(http::header::COOKIE, "session=s1")
            .body(Vec::new())
            .unwrap();
        assert!(matches!(decide(&engine, &request), AuthDecision::Rejected { .. }));
    }

    #[test]
    fn test_should_sign_response_verifiable_by_sender() {
        let options = HawkOptions {
            sign_responses: true,
            ..HawkOptions::default()
        };
        let engine = engine_with(options, Arc::new(FixedClock::new(NOW)));
        let sender = sender_at(NOW);
        let request = signed(&sender, BODY);
        let ctx = RequestContext::from_request(&request);

        let identity = engine.authenticate(&ctx).unwrap().into_result().unwrap();
        let header = engine
            .sign_response(&ctx, Some(&identity), b"{\"ok\": true}", "application/json")
            .unwrap();

        let parsed: crate::header::HawkHeader = header.parse().unwrap();
        assert!(parsed.mac.is_some());
        assert_eq!(
            parsed.hash,
            Some(crate::canonical::payload_hash(
                Algorithm::Sha256,
                b"{\"ok\": true}",
                "application/json"
            ))
        );
        assert!(header.starts_with("Hawk mac=\""));
        assert!(
            sender
                .accept_response(&header, b"{\"ok\": true}", "application/json")
                .is_ok()
        );
        assert_eq!(
            sender.accept_response(&header, b"{\"ok\": false}", "application/json"),
            Err(AuthError::PayloadHashMismatch)
        );
    }

    #[test]
    fn test_should_sign_without_recording_nonce_when_auth_disabled() {
        let options = HawkOptions {
            enabled: false,
            sign_responses: true,
            ..HawkOptions::default()
        };
        let engine = engine_with(options, Arc::new(FixedClock::new(NOW)));
        let sender = sender_at(NOW);
        let request = signed(&sender, BODY);
        let ctx = RequestContext::from_request(&request);

        let identity = engine.authenticate(&ctx).unwrap().into_result().unwrap();
        let header = engine
            .sign_response(&ctx, Some(&identity), b"done", "text/plain")
            .unwrap();
        assert!(sender.accept_response(&header, b"done", "text/plain").is_ok());
        assert!(engine.nonce_store().is_empty());
    }

    #[test]
    fn test_should_skip_signing_when_not_possible() {
        let options = HawkOptions {
            sign_responses: true,
            ..HawkOptions::default()
        };
        let engine = engine_with(options, Arc::new(FixedClock::new(NOW)));

        let unsigned = http::Request::builder()
            .uri("http://localhost:5000/")
            .body(Vec::new())
            .unwrap();
        let ctx = RequestContext::from_request(&unsigned);
        assert!(engine.sign_response(&ctx, None, b"", "").is_none());

        let bad = with_authorization("blah");
        let ctx = RequestContext::from_request(&bad);
        assert!(engine.sign_response(&ctx, None, b"", "").is_none());

        let off = engine_with(HawkOptions::default(), Arc::new(FixedClock::new(NOW)));
        let request = signed(&sender_at(NOW), BODY);
        let ctx = RequestContext::from_request(&request);
        assert!(off.sign_response(&ctx, None, b"", "").is_none());
    }

    #[test]
    fn test_should_admit_exactly_one_of_concurrent_replays() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let engine = engine();
        let request = signed(&sender_at(NOW), BODY);
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    if matches!(decide(&engine, &request), AuthDecision::Authenticated(_)) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}
