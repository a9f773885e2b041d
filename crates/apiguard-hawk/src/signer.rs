//! `Server-Authorization` response signing.
//!
//! The response MAC reuses the request's timestamp, nonce and target, covers a
//! hash of the response body, and is sent back as:
//!
//! ```text
//! Server-Authorization: Hawk mac="...", hash="..."
//! ```

use std::fmt::Write;

use crate::canonical::{CanonicalRequest, MacType, payload_hash};
use crate::header::SCHEME;
use crate::verifier::VerifiedRequest;

/// Name of the response header carrying the server's MAC.
pub const SERVER_AUTHORIZATION: &str = "server-authorization";

/// Build the `Server-Authorization` value for a response to `verified`.
///
/// Attributes are written `mac`, `hash`, then `ext` when present. `ext` must
/// already be a valid attribute value.
#[must_use]
pub fn server_authorization(
    verified: &VerifiedRequest,
    body: &[u8],
    content_type: &str,
    ext: Option<&str>,
) -> String {
    let credentials = &verified.credentials;
    let hash = payload_hash(credentials.algorithm, body, content_type);
    let mac = CanonicalRequest {
        mac_type: MacType::Response,
        ts: verified.header.ts.as_deref().unwrap_or_default(),
        nonce: verified.header.nonce.as_deref().unwrap_or_default(),
        target: &verified.target,
        hash: Some(&hash),
        ext,
        app: verified.header.app.as_deref(),
        dlg: verified.header.dlg.as_deref(),
    }
    .mac(credentials);

    let mut value = format!(r#"{SCHEME} mac="{mac}", hash="{hash}""#);
    if let Some(ext) = ext {
        let _ = write!(value, r#", ext="{ext}""#);
    }
    value
}
