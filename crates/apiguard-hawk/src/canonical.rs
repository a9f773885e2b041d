//! Normalized request strings and payload hashes.
//!
//! The MAC covers a newline-terminated normalized string:
//!
//! ```text
//! hawk.1.<header|response>\n
//! <ts>\n
//! <nonce>\n
//! <METHOD>\n
//! <path[?query]>\n
//! <host>\n
//! <port>\n
//! <payload hash or empty>\n
//! <ext or empty>\n
//! [<app>\n<dlg or empty>\n]
//! ```
//!
//! and the payload hash covers:
//!
//! ```text
//! hawk.1.payload\n<media type, lowercase, no parameters>\n<body>\n
//! ```
//!
//! Both sides of the exchange (the [`Sender`](crate::Sender) and the
//! [`MacVerifier`](crate::MacVerifier)) build these strings from a
//! [`RequestTarget`] so that they agree byte for byte.

use http::uri::Authority;
use http::{HeaderMap, Method, Uri};

use crate::algorithm::Algorithm;
use crate::credentials::HawkCredentials;
use crate::error::AuthError;

/// Protocol version prefix for every normalized string.
const PREFIX: &str = "hawk.1";

/// Which MAC is being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacType {
    /// The request MAC carried in `Authorization`.
    Header,
    /// The response MAC carried in `Server-Authorization`.
    Response,
}

impl MacType {
    /// The type's name inside the normalized string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Response => "response",
        }
    }
}

/// The parts of the request line that the MAC covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Uppercase method.
    pub method: String,
    /// Path plus `?query` if present.
    pub resource: String,
    /// Lowercase host.
    pub host: String,
    /// Port, defaulted from the scheme when absent.
    pub port: u16,
}

impl RequestTarget {
    /// Derive the target from a request.
    ///
    /// Host and port come from the URI authority when the request line is in
    /// absolute form, otherwise from the `Host` header. Without an explicit
    /// scheme `default_scheme` decides the default port.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHost`] when neither source names a host.
    pub fn from_request(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        default_scheme: &str,
    ) -> Result<Self, AuthError> {
        let authority = match uri.authority() {
            Some(authority) => authority.clone(),
            None => headers
                .get(http::header::HOST)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<Authority>().ok())
                .ok_or(AuthError::MissingHost)?,
        };
        let scheme = uri.scheme_str().unwrap_or(default_scheme);
        Self::build(method, uri, &authority, scheme)
    }

    /// Derive the target from an absolute URL, as a client does.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHost`] when `uri` has no authority.
    pub fn from_uri(method: &Method, uri: &Uri) -> Result<Self, AuthError> {
        let authority = uri.authority().ok_or(AuthError::MissingHost)?;
        Self::build(method, uri, authority, uri.scheme_str().unwrap_or("http"))
    }

    fn build(
        method: &Method,
        uri: &Uri,
        authority: &Authority,
        scheme: &str,
    ) -> Result<Self, AuthError> {
        let host = authority.host();
        if host.is_empty() {
            return Err(AuthError::MissingHost);
        }
        let port = authority
            .port_u16()
            .unwrap_or_else(|| default_port(scheme));
        let resource = match uri.path_and_query().map(|pq| pq.as_str()) {
            Some(pq) if !pq.is_empty() => pq.to_owned(),
            _ => "/".to_owned(),
        };

        Ok(Self {
            method: method.as_str().to_ascii_uppercase(),
            resource,
            host: host.to_ascii_lowercase(),
            port,
        })
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

/// The inputs of one MAC computation.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRequest<'a> {
    /// Header or response MAC.
    pub mac_type: MacType,
    /// Timestamp exactly as sent.
    pub ts: &'a str,
    /// Nonce.
    pub nonce: &'a str,
    /// Method, resource, host and port.
    pub target: &'a RequestTarget,
    /// Payload hash, if any.
    pub hash: Option<&'a str>,
    /// Application data, if any.
    pub ext: Option<&'a str>,
    /// Oz application id.
    pub app: Option<&'a str>,
    /// Oz delegated-by application id.
    pub dlg: Option<&'a str>,
}

impl CanonicalRequest<'_> {
    /// Build the normalized string.
    #[must_use]
    pub fn normalized_string(&self) -> String {
        let mut out = format!(
            "{PREFIX}.{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            self.mac_type.as_str(),
            self.ts,
            self.nonce,
            self.target.method,
            self.target.resource,
            self.target.host,
            self.target.port,
            self.hash.unwrap_or_default(),
            self.ext.unwrap_or_default(),
        );
        if let Some(app) = self.app {
            out.push_str(app);
            out.push('\n');
            out.push_str(self.dlg.unwrap_or_default());
            out.push('\n');
        }
        out
    }

    /// Compute the base64 MAC with `credentials`.
    #[must_use]
    pub fn mac(&self, credentials: &HawkCredentials) -> String {
        credentials
            .algorithm
            .hmac_base64(&credentials.key, self.normalized_string().as_bytes())
    }
}

/// Reduce a `Content-Type` value to its lowercase media type.
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Compute the base64 payload hash of `body` sent as `content_type`.
///
/// ```
/// use apiguard_hawk::{Algorithm, payload_hash};
///
/// let hash = payload_hash(Algorithm::Sha256, b"Thank you for flying Hawk", "text/plain");
/// assert_eq!(hash, "Yi9LfIIFRtBEPt74PVmbTF/xVAwPn7ub15ePICfgnuY=");
/// ```
#[must_use]
pub fn payload_hash(algorithm: Algorithm, body: &[u8], content_type: &str) -> String {
    let media_type = media_type(content_type);
    algorithm.digest_base64(&[
        PREFIX.as_bytes(),
        b".payload\n",
        media_type.as_bytes(),
        b"\n",
        body,
        b"\n",
    ])
}
