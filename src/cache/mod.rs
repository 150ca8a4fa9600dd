//! Load-Through Cache System
//!
//! Byte-bounded LRU caching with a cache-or-compute facade.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                          Group ("scores")                                │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  SyncCache (Mutex)        │ FlightGroup            │ Loader               │
//! │  ┌────────────────────┐   │ ┌──────────────────┐   │ ┌──────────────────┐ │
//! │  │ LruCache<ByteView> │   │ │ per-key in-flight│   │ │ LoaderFn / DB /  │ │
//! │  │ slot arena + index │   │ │ load dedup       │   │ │ MapLoader        │ │
//! │  └────────────────────┘   │ └──────────────────┘   │ └──────────────────┘ │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookup: cache hit returns the stored [`ByteView`]; a miss runs the loader
//! (once per key among concurrent callers), stores the result and returns it.
//! Loader failures are returned verbatim and never cached.

mod flight;
mod group;
mod loader;
mod lru;
mod metrics;
#[cfg(test)]
mod proptest;
mod registry;
mod sync;
mod view;

pub use flight::FlightGroup;
pub use group::{Group, GroupConfig};
pub use loader::{loader_fn, LoadError, Loader, LoaderFn, MapLoader};
pub use lru::{EvictionCallback, LruCache, SizedValue};
pub use metrics::{GroupMetrics, StatsSnapshot};
pub use registry::GroupRegistry;
pub use sync::SyncCache;
pub use view::ByteView;

/// Default group budget (64MB)
pub const DEFAULT_CACHE_BYTES: i64 = 64 * 1024 * 1024;
