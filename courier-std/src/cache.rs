//! In-memory response cache.

use courier_core::{CachedResponse, ResponseCache};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

struct Entry {
    value: CachedResponse,
    expires_at: Instant,
}

/// A process-local [`ResponseCache`] with per-entry expiration.
///
/// Clones share the same storage. Expired entries are dropped lazily on
/// lookup or by [`purge_expired`](Self::purge_expired).
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Remove one entry.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries().retain(|_, entry| entry.expires_at > now);
    }

    fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(Arc::clone(&entry.value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: &str, value: CachedResponse, expiration: Duration) {
        let expires_at = Instant::now() + expiration;
        self.entries()
            .insert(key.to_string(), Entry { value, expires_at });
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.lookup(key)
    }

    async fn set(&self, key: &str, value: CachedResponse, expiration: Duration) {
        self.store(key, value, expiration);
    }
}
