//! cachegroup - Byte-Bounded Load-Through Cache
//!
//! An in-process cache that evicts the least recently used entry once a byte
//! budget is exceeded, plus a "cache-or-compute" facade that fills misses
//! from a caller-supplied loader and memoizes the result.
//!
//! # Architecture
//!
//! ```text
//! caller → Group::get(key) → LruCache hit? → ByteView
//!                               │ miss
//!                               ▼
//!                        Loader::load(key) → wrap → LruCache::add → ByteView
//! ```
//!
//! # Modules
//!
//! - [`cache`] - LRU eviction cache, byte views, loaders and groups
//! - [`error`] - Error types
//! - [`metrics`] - Prometheus exposition of group statistics
//!
//! # Example
//!
//! ```
//! use cachegroup::{loader_fn, Group};
//!
//! let group = Group::new("echo", 2 << 10, loader_fn(|key: &str| Ok(key.as_bytes().to_vec())));
//! assert_eq!(group.get("hello").unwrap().to_string(), "hello");
//! ```

pub mod cache;
pub mod error;
pub mod metrics;

// Re-export commonly used types
pub use cache::{
    loader_fn, ByteView, Group, GroupConfig, GroupRegistry, LoadError, Loader, LoaderFn, LruCache,
    MapLoader, SizedValue, StatsSnapshot,
};
pub use error::{Error, Result};
pub use metrics::Exporter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
