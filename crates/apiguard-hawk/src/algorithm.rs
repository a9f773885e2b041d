//! Hash and HMAC algorithms supported by Hawk.
//!
//! Both the payload hash and the request MAC use the algorithm configured for
//! the credentials. Digests are emitted as standard (padded) base64.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// A MAC/hash algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// HMAC-SHA1 / SHA-1. Kept for interoperability with older clients.
    Sha1,
    /// HMAC-SHA256 / SHA-256.
    #[default]
    Sha256,
}

impl Algorithm {
    /// The algorithm's canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Hash the concatenation of `parts` and return it base64-encoded.
    #[must_use]
    pub fn digest_base64(self, parts: &[&[u8]]) -> String {
        match self {
            Self::Sha1 => BASE64.encode(digest::<Sha1>(parts)),
            Self::Sha256 => BASE64.encode(digest::<Sha256>(parts)),
        }
    }

    /// Compute `HMAC(key, data)` and return it base64-encoded.
    #[must_use]
    pub fn hmac_base64(self, key: &[u8], data: &[u8]) -> String {
        let tag = match self {
            Self::Sha1 => {
                let mut mac =
                    HmacSha1::new_from_slice(key).expect("HMAC can accept keys of any length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Self::Sha256 => {
                let mut mac =
                    HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        };
        BASE64.encode(tag)
    }
}

fn digest<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(UnsupportedAlgorithm(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_algorithm_names() {
        assert_eq!("sha256".parse::<Algorithm>().unwrap(), Algorithm::Sha256);
        assert_eq!("SHA1".parse::<Algorithm>().unwrap(), Algorithm::Sha1);
        assert!("md5".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_should_hash_known_vectors() {
        // SHA-256("") and SHA-1("")
        assert_eq!(
            Algorithm::Sha256.digest_base64(&[]),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
        assert_eq!(
            Algorithm::Sha1.digest_base64(&[b"", b""]),
            "2jmj7l5rSw0yVb/vlWAYkK/YBwk="
        );
    }

    #[test]
    fn test_should_hash_parts_as_concatenation() {
        assert_eq!(
            Algorithm::Sha256.digest_base64(&[b"hello ", b"world"]),
            Algorithm::Sha256.digest_base64(&[b"hello world"])
        );
    }

    #[test]
    fn test_should_compute_hmac_sha256() {
        // RFC 4231 test case 2
        let tag = Algorithm::Sha256.hmac_base64(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(tag, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }
}
