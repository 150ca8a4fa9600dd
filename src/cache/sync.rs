//! Mutex-guarded LRU cache
//!
//! [`LruCache`] is single-owner. `SyncCache` holds one behind a
//! `parking_lot::Mutex` so a group can be shared across threads; each
//! operation holds the lock for exactly one cache call.

use std::sync::Arc;

use parking_lot::Mutex;

use super::lru::LruCache;
use super::metrics::GroupMetrics;
use super::view::ByteView;

/// Thread-safe wrapper around an `LruCache<ByteView>`
pub struct SyncCache {
    inner: Mutex<LruCache<ByteView>>,
}

impl SyncCache {
    /// Create a cache with the given budget, counting evictions into `metrics`
    pub fn new(cache_bytes: i64, metrics: Arc<GroupMetrics>) -> Self {
        let on_evicted = move |_: &str, _: &ByteView| metrics.record_eviction();
        let lru = LruCache::with_eviction_callback(cache_bytes, on_evicted);
        Self {
            inner: Mutex::new(lru),
        }
    }

    /// Look up a key; a hit refreshes its recency
    pub fn get(&self, key: &str) -> Option<ByteView> {
        self.inner.lock().get(key).cloned()
    }

    /// Insert or replace a value
    pub fn add(&self, key: &str, view: ByteView) {
        self.inner.lock().add(key, view);
    }

    /// Evict the least recently used entry
    pub fn remove_oldest(&self) -> Option<(String, ByteView)> {
        self.inner.lock().remove_oldest()
    }

    /// Remove a key without counting it as an eviction
    pub fn remove(&self, key: &str) -> Option<ByteView> {
        self.inner.lock().remove(key)
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Bytes charged against the budget
    pub fn used_bytes(&self) -> i64 {
        self.inner.lock().used_bytes()
    }

    /// Configured budget
    pub fn max_bytes(&self) -> i64 {
        self.inner.lock().max_bytes()
    }

    /// Entry count and used bytes read under one lock
    pub fn occupancy(&self) -> (usize, i64) {
        let guard = self.inner.lock();
        (guard.len(), guard.used_bytes())
    }
}

impl std::fmt::Debug for SyncCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SyncCache")
            .field(&*self.inner.lock())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
