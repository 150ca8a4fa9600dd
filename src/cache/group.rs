//! Group - Load-Through Cache
//!
//! A named namespace owning one LRU cache and one loader. Lookups are served
//! from the cache; a miss invokes the loader, stores the result and returns
//! it. Failed loads are surfaced unchanged and leave the cache untouched.
//!
//! ```text
//! get(key) ──▶ cache hit? ──yes──▶ view
//!                 │ no
//!                 ▼
//!         in-flight dedup ──▶ loader.load(key) ──▶ cache.add(key, view) ──▶ view
//! ```

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::flight::FlightGroup;
use super::loader::Loader;
use super::metrics::{GroupMetrics, StatsSnapshot};
use super::sync::SyncCache;
use super::view::ByteView;
use super::DEFAULT_CACHE_BYTES;
use crate::error::{Error, Result, SharedLoadError};

/// Group configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Namespace name
    pub name: String,
    /// Cache budget in bytes (<= 0 = unbounded)
    pub cache_bytes: i64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            cache_bytes: DEFAULT_CACHE_BYTES,
        }
    }
}

type LoadOutcome = std::result::Result<ByteView, SharedLoadError>;

/// Load-through cache for one namespace
pub struct Group {
    name: String,
    main_cache: SyncCache,
    loader: Box<dyn Loader>,
    flight: FlightGroup<LoadOutcome>,
    metrics: Arc<GroupMetrics>,
}

impl Group {
    /// Create a group with the given byte budget and loader
    pub fn new(name: impl Into<String>, cache_bytes: i64, loader: impl Loader + 'static) -> Self {
        Self::with_config(
            GroupConfig {
                name: name.into(),
                cache_bytes,
            },
            loader,
        )
    }

    /// Create a group from configuration
    pub fn with_config(config: GroupConfig, loader: impl Loader + 'static) -> Self {
        let metrics = Arc::new(GroupMetrics::new());
        Self {
            name: config.name,
            main_cache: SyncCache::new(config.cache_bytes, Arc::clone(&metrics)),
            loader: Box::new(loader),
            flight: FlightGroup::new(),
            metrics,
        }
    }

    /// Get the value for `key`, loading it on a miss
    pub fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        self.metrics.record_get();

        if let Some(view) = self.main_cache.get(key) {
            self.metrics.record_hit();
            debug!(group = %self.name, key, "cache hit");
            return Ok(view);
        }
        self.metrics.record_miss();
        debug!(group = %self.name, key, "cache miss");

        self.load(key)
    }

    /// Store a value obtained elsewhere without calling the loader
    pub fn populate(&self, key: &str, view: ByteView) -> Result<()> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        self.main_cache.add(key, view);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<ByteView> {
        let (outcome, shared) = self.flight.run(key, || {
            // Filled by a call that finished while we were queued
            if let Some(view) = self.main_cache.get(key) {
                return Ok(view);
            }
            self.load_locally(key)
        });

        if shared {
            self.metrics.record_shared_load();
            debug!(group = %self.name, key, "joined in-flight load");
        }

        outcome.map_err(Error::Loader)
    }

    fn load_locally(&self, key: &str) -> LoadOutcome {
        self.metrics.record_load();

        let bytes = self.loader.load(key).map_err(|err| {
            self.metrics.record_load_error();
            warn!(group = %self.name, key, error = %err, "loader failed");
            SharedLoadError::from(err)
        })?;

        let view = ByteView::from(bytes);
        self.main_cache.add(key, view.clone());
        Ok(view)
    }

    /// Get group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get number of cached entries
    pub fn cached_entries(&self) -> usize {
        self.main_cache.len()
    }

    /// Bytes charged against the cache budget
    pub fn cached_bytes(&self) -> i64 {
        self.main_cache.used_bytes()
    }

    /// Configured cache budget
    pub fn cache_bytes(&self) -> i64 {
        self.main_cache.max_bytes()
    }

    /// Get statistics snapshot
    pub fn stats(&self) -> StatsSnapshot {
        let (entries, bytes) = self.main_cache.occupancy();
        StatsSnapshot {
            in_flight_loads: self.flight.in_flight(),
            ..self.metrics.snapshot(entries, bytes)
        }
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("cache", &self.main_cache)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
