//! Client-side request signing.
//!
//! A [`Sender`] produces the `Authorization` header for one request and then
//! verifies the server's `Server-Authorization` reply to it.
//!
//! ```rust
//! use apiguard_hawk::{Algorithm, HawkCredentials, Sender};
//!
//! let credentials = HawkCredentials::new("Alice", "secret", Algorithm::Sha256);
//! let sender = Sender::builder(credentials, http::Method::POST, "http://localhost:5000/")
//!     .body(br#"{"hello":"world"}"#.to_vec(), "application/json")
//!     .build()
//!     .unwrap();
//!
//! assert!(sender.request_header().starts_with("Hawk id=\"Alice\""));
//! ```

use http::{Method, Uri};
use subtle::ConstantTimeEq;

use crate::canonical::{CanonicalRequest, MacType, RequestTarget, payload_hash};
use crate::clock::{Clock, SystemClock};
use crate::credentials::HawkCredentials;
use crate::error::AuthError;
use crate::header::{HawkHeader, is_valid_attribute_value};

/// A signed outgoing request.
#[derive(Debug, Clone)]
pub struct Sender {
    credentials: HawkCredentials,
    target: RequestTarget,
    header: HawkHeader,
}

impl Sender {
    /// Start signing a request to `url`.
    #[must_use]
    pub fn builder(credentials: HawkCredentials, method: Method, url: &str) -> SenderBuilder {
        SenderBuilder {
            credentials,
            method,
            url: url.to_owned(),
            body: Vec::new(),
            content_type: String::new(),
            hash_payload: true,
            ext: None,
            timestamp: None,
            nonce: None,
        }
    }

    /// Sign a request with the current time and a random nonce.
    ///
    /// # Errors
    ///
    /// See [`SenderBuilder::build`].
    pub fn sign(
        credentials: HawkCredentials,
        method: Method,
        url: &str,
        body: &[u8],
        content_type: &str,
        ext: Option<&str>,
    ) -> Result<Self, AuthError> {
        let mut builder = Self::builder(credentials, method, url).body(body, content_type);
        if let Some(ext) = ext {
            builder = builder.ext(ext);
        }
        builder.build()
    }

    /// The `Authorization` header value.
    #[must_use]
    pub fn request_header(&self) -> String {
        self.header.to_string()
    }

    /// The attributes that were signed.
    #[must_use]
    pub fn header(&self) -> &HawkHeader {
        &self.header
    }

    /// Verify the server's `Server-Authorization` reply.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the header is malformed, lacks a hash, or
    /// when the hash or MAC do not match the response.
    pub fn accept_response(
        &self,
        server_authorization: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), AuthError> {
        let reply: HawkHeader = server_authorization.parse()?;
        let mac = HawkHeader::require(&reply.mac, "mac")?;
        let hash = reply.hash.as_deref().ok_or(AuthError::MissingPayloadHash)?;

        let expected_hash = payload_hash(self.credentials.algorithm, body, content_type);
        if !bool::from(hash.as_bytes().ct_eq(expected_hash.as_bytes())) {
            return Err(AuthError::PayloadHashMismatch);
        }

        let expected_mac = CanonicalRequest {
            mac_type: MacType::Response,
            ts: self.header.ts.as_deref().unwrap_or_default(),
            nonce: self.header.nonce.as_deref().unwrap_or_default(),
            target: &self.target,
            hash: Some(hash),
            ext: reply.ext.as_deref(),
            app: self.header.app.as_deref(),
            dlg: self.header.dlg.as_deref(),
        }
        .mac(&self.credentials);
        if bool::from(mac.as_bytes().ct_eq(expected_mac.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::MacMismatch)
        }
    }
}

/// Builder for [`Sender`].
#[derive(Debug)]
pub struct SenderBuilder {
    credentials: HawkCredentials,
    method: Method,
    url: String,
    body: Vec<u8>,
    content_type: String,
    hash_payload: bool,
    ext: Option<String>,
    timestamp: Option<i64>,
    nonce: Option<String>,
}

impl SenderBuilder {
    /// Set the request body and its content type.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        self.body = body.into();
        self.content_type = content_type.into();
        self
    }

    /// Leave the payload hash out of the header.
    #[must_use]
    pub fn without_payload_hash(mut self) -> Self {
        self.hash_payload = false;
        self
    }

    /// Attach application data.
    #[must_use]
    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    /// Use a fixed timestamp instead of the system clock.
    #[must_use]
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Use a fixed nonce instead of a random one.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sign the request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUrl`] for a URL without a host, and
    /// [`AuthError::MalformedHeader`] for `ext` data that cannot be quoted.
    pub fn build(self) -> Result<Sender, AuthError> {
        let uri: Uri = self
            .url
            .parse()
            .map_err(|_| AuthError::InvalidUrl(self.url.clone()))?;
        let target = RequestTarget::from_uri(&self.method, &uri)
            .map_err(|_| AuthError::InvalidUrl(self.url.clone()))?;
        if self
            .ext
            .as_deref()
            .is_some_and(|ext| !is_valid_attribute_value(ext))
        {
            return Err(AuthError::MalformedHeader("invalid ext value".to_owned()));
        }

        let ts = self
            .timestamp
            .unwrap_or_else(|| SystemClock.now())
            .to_string();
        let nonce = self
            .nonce
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let hash = self.hash_payload.then(|| {
            payload_hash(self.credentials.algorithm, &self.body, &self.content_type)
        });

        let mac = CanonicalRequest {
            mac_type: MacType::Header,
            ts: &ts,
            nonce: &nonce,
            target: &target,
            hash: hash.as_deref(),
            ext: self.ext.as_deref(),
            app: None,
            dlg: None,
        }
        .mac(&self.credentials);

        let header = HawkHeader {
            id: Some(self.credentials.id.clone()),
            ts: Some(ts),
            nonce: Some(nonce),
            hash,
            ext: self.ext,
            mac: Some(mac),
            ..HawkHeader::default()
        };

        Ok(Sender {
            credentials: self.credentials,
            target,
            header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;

    fn credentials() -> HawkCredentials {
        HawkCredentials::new(
            "dh37fgj492je",
            "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn",
            Algorithm::Sha256,
        )
    }

    #[test]
    fn test_should_reproduce_reference_header() {
        let sender = Sender::builder(
            credentials(),
            Method::POST,
            "http://example.com:8000/resource/1?b=1&a=2",
        )
        .body("Thank you for flying Hawk", "text/plain")
        .ext("some-app-ext-data")
        .timestamp(1_353_832_234)
        .nonce("j4h3g2")
        .build()
        .unwrap();

        assert_eq!(
            sender.request_header(),
            r#"Hawk id="dh37fgj492je", ts="1353832234", nonce="j4h3g2", hash="Yi9LfIIFRtBEPt74PVmbTF/xVAwPn7ub15ePICfgnuY=", ext="some-app-ext-data", mac="aSe1DERmZuRl3pI36/9BdZmnErTw3sNzOOAUlfeKjVw=""#
        );
    }

    #[test]
    fn test_should_sign_with_current_time() {
        let sender = Sender::sign(
            credentials(),
            Method::PUT,
            "https://api.example.com/items/1",
            b"payload",
            "text/plain",
            Some("trace=1"),
        )
        .unwrap();
        let ts: i64 = sender.header().ts.as_deref().unwrap().parse().unwrap();
        assert!((SystemClock.now() - ts).abs() <= 5);
        assert_eq!(sender.header().ext.as_deref(), Some("trace=1"));
        assert!(sender.header().hash.is_some());
    }

    #[test]
    fn test_should_generate_unique_nonces() {
        let a = Sender::builder(credentials(), Method::GET, "http://localhost/")
            .build()
            .unwrap();
        let b = Sender::builder(credentials(), Method::GET, "http://localhost/")
            .build()
            .unwrap();
        assert_ne!(a.header().nonce, b.header().nonce);
    }

    #[test]
    fn test_should_omit_hash_when_requested() {
        let sender = Sender::builder(credentials(), Method::GET, "http://localhost/")
            .without_payload_hash()
            .build()
            .unwrap();
        assert!(sender.header().hash.is_none());
        assert!(!sender.request_header().contains("hash="));
    }

    #[test]
    fn test_should_reject_relative_url_and_bad_ext() {
        assert!(matches!(
            Sender::builder(credentials(), Method::GET, "/relative").build(),
            Err(AuthError::InvalidUrl(_))
        ));
        assert!(matches!(
            Sender::builder(credentials(), Method::GET, "http://localhost/")
                .ext("a\"b")
                .build(),
            Err(AuthError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_should_accept_reference_response() {
        let sender = Sender::builder(
            credentials(),
            Method::POST,
            "http://example.com:8000/resource/1?b=1&a=2",
        )
        .body("Thank you for flying Hawk", "text/plain")
        .timestamp(1_353_832_234)
        .nonce("j4h3g2")
        .build()
        .unwrap();

        let reply = r#"Hawk mac="tXrD9dGzAutHCITIjuaWx3dvQdC8AZ0DzXSalcUi5Ow=", hash="Yi9LfIIFRtBEPt74PVmbTF/xVAwPn7ub15ePICfgnuY=""#;
        assert!(
            sender
                .accept_response(reply, b"Thank you for flying Hawk", "text/plain")
                .is_ok()
        );
        assert_eq!(
            sender.accept_response(reply, b"tampered", "text/plain"),
            Err(AuthError::PayloadHashMismatch)
        );
    }
}
