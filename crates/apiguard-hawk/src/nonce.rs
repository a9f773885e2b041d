//! Replay protection.
//!
//! A nonce is remembered per client id until the timestamp it arrived with
//! can no longer pass the freshness check. Lookups and inserts are a single
//! atomic operation per key, so two concurrent requests carrying the same
//! `(id, nonce)` pair can never both be accepted.

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// One remembered nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    /// Timestamp the nonce arrived with.
    pub timestamp: i64,
    /// Last server time (offset applied) at which the record can matter.
    pub expires_at: i64,
}

/// Concurrent store of recently seen `(client id, nonce)` pairs.
#[derive(Debug)]
pub struct NonceStore {
    entries: DashMap<(String, String), NonceRecord>,
    last_sweep: AtomicI64,
    sweep_interval: i64,
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new(60)
    }
}

impl NonceStore {
    /// Create a store that sweeps expired entries at most every `sweep_interval` seconds.
    #[must_use]
    pub fn new(sweep_interval: i64) -> Self {
        Self {
            entries: DashMap::new(),
            last_sweep: AtomicI64::new(i64::MIN),
            sweep_interval: sweep_interval.max(1),
        }
    }

    /// Whether `(client_id, nonce)` was recorded and has not expired at `now`.
    ///
    /// Read-only: it never records anything, so a request that later
    /// fails verification leaves the store untouched.
    #[must_use]
    pub fn is_live(&self, client_id: &str, nonce: &str, now: i64) -> bool {
        self.entries
            .get(&(client_id.to_owned(), nonce.to_owned()))
            .is_some_and(|record| record.expires_at >= now)
    }

    /// Record `(client_id, nonce)` unless it is already live.
    ///
    /// Returns `true` when the nonce is fresh and has been recorded, `false`
    /// when it is a replay. The record lives until `timestamp + window` in
    /// server time.
    pub fn check_and_insert(
        &self,
        client_id: &str,
        nonce: &str,
        timestamp: i64,
        window: i64,
        now: i64,
    ) -> bool {
        self.maybe_sweep(now);

        let record = NonceRecord {
            timestamp,
            expires_at: timestamp.saturating_add(window),
        };
        match self.entries.entry((client_id.to_owned(), nonce.to_owned())) {
            Entry::Occupied(mut entry) => {
                if entry.get().expires_at >= now {
                    return false;
                }
                entry.insert(record);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    /// Drop every record that expired before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, record| record.expires_at >= now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "purged expired nonces");
        }
        removed
    }

    /// Number of remembered nonces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no nonces are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn maybe_sweep(&self, now: i64) {
        let last = self.last_sweep.load(Ordering::Relaxed);
        if now.saturating_sub(last) < self.sweep_interval {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.purge_expired(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_should_reject_replayed_nonce() {
        let store = NonceStore::default();
        assert!(store.check_and_insert("Alice", "abc", 1000, 60, 1000));
        assert!(!store.check_and_insert("Alice", "abc", 1000, 60, 1001));
    }

    #[test]
    fn test_should_report_liveness_without_recording() {
        let store = NonceStore::default();
        assert!(!store.is_live("Alice", "abc", 1000));
        assert!(store.is_empty());

        assert!(store.check_and_insert("Alice", "abc", 1000, 60, 1000));
        assert!(store.is_live("Alice", "abc", 1060));
        assert!(!store.is_live("Alice", "abc", 1061));
        assert!(!store.is_live("Carol", "abc", 1000));
    }

    #[test]
    fn test_should_scope_nonces_per_client() {
        let store = NonceStore::default();
        assert!(store.check_and_insert("Alice", "abc", 1000, 60, 1000));
        assert!(store.check_and_insert("Carol", "abc", 1000, 60, 1000));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_should_keep_nonce_until_window_closes() {
        let store = NonceStore::default();
        assert!(store.check_and_insert("Alice", "abc", 1000, 60, 1000));
        assert!(!store.check_and_insert("Alice", "abc", 1000, 60, 1060));
        assert!(store.check_and_insert("Alice", "abc", 1061, 60, 1061));
    }

    #[test]
    fn test_should_purge_only_expired_entries() {
        let store = NonceStore::default();
        store.check_and_insert("Alice", "old", 1000, 60, 1000);
        store.check_and_insert("Alice", "new", 1050, 60, 1050);

        assert_eq!(store.purge_expired(1070), 1);
        assert_eq!(store.len(), 1);
        assert!(!store.check_and_insert("Alice", "new", 1050, 60, 1070));
    }

    #[test]
    fn test_should_sweep_lazily_on_insert() {
        let store = NonceStore::new(10);
        store.check_and_insert("Alice", "a", 1000, 5, 1000);
        store.check_and_insert("Alice", "b", 1020, 5, 1020);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_should_accept_exactly_one_of_concurrent_duplicates() {
        let store = Arc::new(NonceStore::default());
        let accepted = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..16 {
                let store = Arc::clone(&store);
                let accepted = Arc::clone(&accepted);
                scope.spawn(move || {
                    if store.check_and_insert("Alice", "race", 1000, 60, 1000) {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }
}
