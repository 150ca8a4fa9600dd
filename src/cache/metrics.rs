//! Group Metrics Collection
//!
//! Lock-free counters describing how a group serves its lookups.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Per-group metrics collector
#[derive(Debug, Default)]
pub struct GroupMetrics {
    gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_errors: AtomicU64,
    shared_loads: AtomicU64,
    evictions: AtomicU64,
}

impl GroupMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_error(&self) {
        self.load_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// A miss answered by another caller's in-flight load
    pub fn record_shared_load(&self) {
        self.shared_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn load_errors(&self) -> u64 {
        self.load_errors.load(Ordering::Relaxed)
    }

    pub fn shared_loads(&self) -> u64 {
        self.shared_loads.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Get hit ratio (0.0 - 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Get snapshot of all counters plus the current cache occupancy
    pub fn snapshot(&self, cached_entries: usize, cached_bytes: i64) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets(),
            hits: self.hits(),
            misses: self.misses(),
            loads: self.loads(),
            load_errors: self.load_errors(),
            shared_loads: self.shared_loads(),
            evictions: self.evictions(),
            hit_ratio: self.hit_ratio(),
            cached_entries,
            cached_bytes,
            in_flight_loads: 0,
        }
    }
}

/// Point-in-time group statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups with a non-empty key
    pub gets: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that missed the cache
    pub misses: u64,
    /// Loader invocations
    pub loads: u64,
    /// Loader invocations that failed
    pub load_errors: u64,
    /// Misses served by a concurrent caller's load
    pub shared_loads: u64,
    /// Entries evicted to stay within budget
    pub evictions: u64,
    /// hits / (hits + misses)
    pub hit_ratio: f64,
    /// Entries currently cached
    pub cached_entries: usize,
    /// Bytes currently charged against the budget
    pub cached_bytes: i64,
    /// Keys with a loader call currently running
    pub in_flight_loads: usize,
}

// =============================================================================
// Tests
// =============================================================================
