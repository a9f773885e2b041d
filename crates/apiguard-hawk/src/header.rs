//! Hawk header wire format.
//!
//! Both the request `Authorization` header and the response
//! `Server-Authorization` header use the same grammar:
//!
//! ```text
//! Hawk id="dh37fgj492je", ts="1353832234", nonce="j4h3g2", hash="...", ext="...", mac="..."
//! ```
//!
//! Attribute values are double-quoted and may not contain `"` or `\`. Unknown
//! and repeated attributes are rejected.

use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// The authentication scheme name.
pub const SCHEME: &str = "Hawk";

/// A parsed Hawk header. Which attributes are required depends on the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HawkHeader {
    /// Client id.
    pub id: Option<String>,
    /// Unix timestamp in seconds, kept as sent so it hashes identically.
    pub ts: Option<String>,
    /// Client-chosen nonce.
    pub nonce: Option<String>,
    /// Base64 payload hash.
    pub hash: Option<String>,
    /// Application-specific data.
    pub ext: Option<String>,
    /// Base64 MAC.
    pub mac: Option<String>,
    /// Oz application id.
    pub app: Option<String>,
    /// Oz delegated-by application id.
    pub dlg: Option<String>,
}

impl HawkHeader {
    /// The value of a required attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingAttribute`] when the attribute is absent.
    pub fn require<'a>(
        value: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, AuthError> {
        value.as_deref().ok_or(AuthError::MissingAttribute(name))
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        Some(match name {
            "id" => &mut self.id,
            "ts" => &mut self.ts,
            "nonce" => &mut self.nonce,
            "hash" => &mut self.hash,
            "ext" => &mut self.ext,
            "mac" => &mut self.mac,
            "app" => &mut self.app,
            "dlg" => &mut self.dlg,
            _ => return None,
        })
    }

    fn attributes(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("id", self.id.as_deref()),
            ("ts", self.ts.as_deref()),
            ("nonce", self.nonce.as_deref()),
            ("hash", self.hash.as_deref()),
            ("ext", self.ext.as_deref()),
            ("mac", self.mac.as_deref()),
            ("app", self.app.as_deref()),
            ("dlg", self.dlg.as_deref()),
        ]
    }
}

/// Whether `value` can be carried inside a quoted attribute.
#[must_use]
pub fn is_valid_attribute_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\')
}

impl FromStr for HawkHeader {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (scheme, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return Err(AuthError::UnknownScheme(scheme.to_owned()));
        }

        let mut header = Self::default();
        let mut rest = rest.trim_start();
        while !rest.is_empty() {
            let (name, after_name) = rest
                .split_once('=')
                .ok_or_else(|| AuthError::MalformedHeader("expected attribute".to_owned()))?;
            let name = name.trim();
            let after_name = after_name
                .trim_start()
                .strip_prefix('"')
                .ok_or_else(|| AuthError::MalformedHeader(format!("unquoted value for {name}")))?;
            let (value, after_value) = after_name
                .split_once('"')
                .ok_or_else(|| AuthError::MalformedHeader(format!("unterminated value for {name}")))?;

            if !is_valid_attribute_value(value) {
                return Err(AuthError::MalformedHeader(format!("bad value for {name}")));
            }
            let slot = header
                .slot(name)
                .ok_or_else(|| AuthError::MalformedHeader(format!("unknown attribute {name}")))?;
            if slot.is_some() {
                return Err(AuthError::MalformedHeader(format!("duplicate attribute {name}")));
            }
            *slot = Some(value.to_owned());

            let after_value = after_value.trim_start();
            rest = match after_value.strip_prefix(',') {
                Some(next) => next.trim_start(),
                None if after_value.is_empty() => after_value,
                None => {
                    return Err(AuthError::MalformedHeader(
                        "expected ',' between attributes".to_owned(),
                    ));
                }
            };
        }

        Ok(header)
    }
}

impl fmt::Display for HawkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SCHEME)?;
        let mut sep = " ";
        for (name, value) in self.attributes() {
            if let Some(value) = value {
                write!(f, "{sep}{name}=\"{value}\"")?;
                sep = ", ";
            }
        }
        Ok(())
    }
}
