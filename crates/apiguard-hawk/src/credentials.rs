//! Credential resolution.
//!
//! The host application supplies a [`KeyLoader`] that maps a client id to its
//! shared secret. [`KeyLoaderResolver`] wraps it into a [`CredentialResolver`]
//! that attaches the configured [`Algorithm`], which is what the verifier
//! consumes.

use std::collections::HashMap;
use std::fmt;

use crate::algorithm::Algorithm;
use crate::error::AuthError;

/// Everything needed to verify a MAC for one client.
#[derive(Clone, PartialEq, Eq)]
pub struct HawkCredentials {
    /// Client id as presented in the `id` attribute.
    pub id: String,
    /// Shared secret.
    pub key: Vec<u8>,
    /// MAC and hash algorithm.
    pub algorithm: Algorithm,
}

impl HawkCredentials {
    /// Create credentials for `id`.
    pub fn new(id: impl Into<String>, key: impl Into<Vec<u8>>, algorithm: Algorithm) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            algorithm,
        }
    }
}

impl fmt::Debug for HawkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HawkCredentials")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// A key loader's report that a client id is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("credentials lookup failed")]
pub struct LookupError;

/// Host-supplied mapping from client id to shared secret.
///
/// Loaders may block or fail; the verifier only records a nonce once a loader
/// has returned successfully.
pub trait KeyLoader: Send + Sync {
    /// Return the shared secret for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if `id` is unknown.
    fn load_key(&self, id: &str) -> Result<Vec<u8>, LookupError>;
}

impl<F> KeyLoader for F
where
    F: Fn(&str) -> Result<Vec<u8>, LookupError> + Send + Sync,
{
    fn load_key(&self, id: &str) -> Result<Vec<u8>, LookupError> {
        self(id)
    }
}

/// Trait for looking up full credentials by client id.
pub trait CredentialResolver: Send + Sync {
    /// Resolve the credentials for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialsNotFound`] if `id` is unknown.
    fn resolve(&self, id: &str) -> Result<HawkCredentials, AuthError>;
}

/// Adapts a [`KeyLoader`] into a [`CredentialResolver`] for a fixed algorithm.
#[derive(Debug, Clone)]
pub struct KeyLoaderResolver<L> {
    loader: L,
    algorithm: Algorithm,
}

impl<L: KeyLoader> KeyLoaderResolver<L> {
    /// Wrap `loader`, attaching `algorithm` to every resolved credential.
    pub fn new(loader: L, algorithm: Algorithm) -> Self {
        Self { loader, algorithm }
    }
}

impl<L: KeyLoader> CredentialResolver for KeyLoaderResolver<L> {
    fn resolve(&self, id: &str) -> Result<HawkCredentials, AuthError> {
        let key = self
            .loader
            .load_key(id)
            .map_err(|_| AuthError::CredentialsNotFound(id.to_owned()))?;
        Ok(HawkCredentials::new(id, key, self.algorithm))
    }
}

/// A simple in-memory key loader backed by a `HashMap`.
///
/// Suitable for testing and development environments.
///
/// # Examples
///
/// ```
/// use apiguard_hawk::credentials::{KeyLoader, StaticKeyLoader};
///
/// let loader = StaticKeyLoader::new([("Alice", "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn")]);
///
/// assert!(loader.load_key("Alice").is_ok());
/// assert!(loader.load_key("Bob").is_err());
/// ```
#[derive(Clone, Default)]
pub struct StaticKeyLoader {
    keys: HashMap<String, Vec<u8>>,
}

impl StaticKeyLoader {
    /// Create a loader from `(id, key)` pairs.
    pub fn new<I, K, V>(keys: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|(id, key)| (id.into(), key.into()))
                .collect(),
        }
    }

    /// Number of known client ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no client ids are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for StaticKeyLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("StaticKeyLoader").field("ids", &ids).finish()
    }
}

impl KeyLoader for StaticKeyLoader {
    fn load_key(&self, id: &str) -> Result<Vec<u8>, LookupError> {
        self.keys.get(id).cloned().ok_or(LookupError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_resolve_known_id_with_configured_algorithm() {
        let resolver =
            KeyLoaderResolver::new(StaticKeyLoader::new([("Alice", "secret")]), Algorithm::Sha1);

        let creds = resolver.resolve("Alice").unwrap();
        assert_eq!(creds.id, "Alice");
        assert_eq!(creds.key, b"secret");
        assert_eq!(creds.algorithm, Algorithm::Sha1);
    }

    #[test]
    fn test_should_report_unknown_id() {
        let resolver = KeyLoaderResolver::new(StaticKeyLoader::default(), Algorithm::Sha256);

        let err = resolver.resolve("Bob").unwrap_err();
        assert_eq!(err, AuthError::CredentialsNotFound("Bob".to_owned()));
        assert_eq!(err.to_string(), "could not find credentials for ID Bob");
    }

    #[test]
    fn test_should_accept_closure_loader() {
        let loader = |id: &str| {
            if id == "svc" {
                Ok(b"k".to_vec())
            } else {
                Err(LookupError)
            }
        };
        let resolver = KeyLoaderResolver::new(loader, Algorithm::Sha256);
        assert!(resolver.resolve("svc").is_ok());
        assert!(resolver.resolve("other").is_err());
    }

    #[test]
    fn test_should_redact_key_in_debug_output() {
        let creds = HawkCredentials::new("Alice", "topsecret", Algorithm::Sha256);
        let debug = format!("{creds:?}");
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("Alice"));
    }
}
