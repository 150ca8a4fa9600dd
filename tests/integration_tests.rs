//! cachegroup Integration Tests
//!
//! Exercises the public API end to end:
//! - Load-through lookups backed by a record table
//! - Byte-budget eviction through the LRU cache
//! - Group registry and Prometheus exposition

use std::sync::Arc;
use std::thread;

use assert_matches::assert_matches;

use cachegroup::{
    loader_fn, ByteView, Error, Exporter, Group, GroupConfig, GroupRegistry, LoadError, LruCache,
    MapLoader,
};

fn score_table() -> Arc<MapLoader> {
    Arc::new(
        [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
            .into_iter()
            .collect(),
    )
}

// =============================================================================
// Load-Through Lookups
// =============================================================================

mod group_tests {
    use super::*;

    #[test]
    fn test_each_key_loads_once() {
        let db = score_table();
        let group = Group::new("scores", 2 << 10, Arc::clone(&db));

        for (key, score) in [("Tom", "630"), ("Jack", "589"), ("Sam", "567")] {
            assert_eq!(group.get(key).unwrap().to_string(), score);
            assert_eq!(group.get(key).unwrap().to_string(), score);
            assert_eq!(db.load_count(key), 1, "{} should be loaded once", key);
        }

        let stats = group.stats();
        assert_eq!(stats.gets, 6);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.loads, 3);
    }

    #[test]
    fn test_unknown_key_reports_loader_error() {
        let db = score_table();
        let group = Group::new("scores", 2 << 10, Arc::clone(&db));

        let err = group.get("unknown").unwrap_err();
        assert_matches!(&err, Error::Loader(_));
        assert_eq!(err.to_string(), "unknown not exist");
        assert_eq!(group.cached_entries(), 0);

        // failures are not memoized
        assert!(group.get("unknown").is_err());
        assert_eq!(group.stats().load_errors, 2);
    }

    #[test]
    fn test_empty_key_never_reaches_loader() {
        let group = Group::new(
            "strict",
            1024,
            loader_fn(|_: &str| -> Result<Vec<u8>, LoadError> {
                panic!("loader must not run for an empty key")
            }),
        );

        assert_matches!(group.get(""), Err(Error::EmptyKey));
        assert_eq!(group.stats().gets, 0);
    }

    #[test]
    fn test_returned_view_is_immutable() {
        let echo = loader_fn(|key: &str| Ok(key.as_bytes().to_vec()));
        let group = Group::new("echo", 0, echo);

        let view = group.get("abc").unwrap();
        let mut copy = view.to_vec();
        copy[0] = b'z';

        assert_eq!(view.to_string(), "abc");
        assert_eq!(group.get("abc").unwrap().to_string(), "abc");
    }

    #[test]
    fn test_config_driven_group() {
        let config: GroupConfig =
            serde_json::from_str(r#"{"name": "configured", "cache_bytes": 16}"#).unwrap();
        let group = Group::with_config(config, loader_fn(|_: &str| Ok(vec![b'x'; 8])));

        assert_eq!(group.name(), "configured");
        assert_eq!(group.cache_bytes(), 16);

        group.get("a").unwrap();
        group.get("b").unwrap();

        // each entry is 9 bytes; the second forces the first out
        assert_eq!(group.cached_entries(), 1);
        assert_eq!(group.cached_bytes(), 9);
        assert_eq!(group.stats().evictions, 1);
    }

    #[test]
    fn test_concurrent_lookups_share_cache() {
        let db = score_table();
        let group = Arc::new(Group::new("scores", 2 << 10, Arc::clone(&db)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let group = Arc::clone(&group);
                thread::spawn(move || {
                    for _ in 0..50 {
                        for key in ["Tom", "Jack", "Sam"] {
                            group.get(key).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.total_loads(), 3);
        let stats = group.stats();
        assert_eq!(stats.gets, 8 * 50 * 3);
        assert_eq!(stats.hits + stats.misses, stats.gets);
    }
}

// =============================================================================
// Eviction
// =============================================================================

mod lru_tests {
    use super::*;

    #[test]
    fn test_least_recent_entry_goes_first() {
        let evicted = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let mut cache = LruCache::with_eviction_callback(10, move |key: &str, _: &ByteView| {
            sink.lock().push(key.to_string());
        });

        cache.add("k1", ByteView::from("v1"));
        cache.add("k2", ByteView::from("v2"));
        assert!(cache.get("k1").is_some());
        cache.add("k3", ByteView::from("v3"));

        assert_eq!(*evicted.lock(), vec!["k2".to_string()]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("k2").is_none());
        assert_eq!(cache.used_bytes(), 8);
    }

    #[test]
    fn test_unbounded_cache_keeps_everything() {
        let mut cache: LruCache<ByteView> = LruCache::new(0);
        for i in 0..1000 {
            cache.add(format!("key-{}", i), ByteView::from(vec![0u8; 64]));
        }
        assert_eq!(cache.len(), 1000);
    }
}

// =============================================================================
// Registry and Exposition
// =============================================================================

mod exposition_tests {
    use super::*;

    #[test]
    fn test_registry_groups_are_exported() {
        let registry = GroupRegistry::new();
        let (scores, _) = registry.register(Group::new("scores", 2 << 10, score_table()));
        let (echo, _) = registry.register(Group::new(
            "echo",
            0,
            loader_fn(|key: &str| Ok(key.as_bytes().to_vec())),
        ));

        scores.get("Tom").unwrap();
        scores.get("Tom").unwrap();
        echo.get("hello").unwrap();

        let exporter = Exporter::new().unwrap();
        exporter.observe_registry(&registry);
        let text = exporter.render().unwrap();

        assert!(text.contains("cachegroup_hits_total{group=\"scores\"} 1"));
        assert!(text.contains("cachegroup_loads_total{group=\"echo\"} 1"));
        assert!(text.contains("cachegroup_cached_entries{group=\"echo\"} 1"));
    }

    #[test]
    fn test_stats_serialize_as_json() {
        let group = Group::new("scores", 2 << 10, score_table());
        group.get("Jack").unwrap();

        let json = serde_json::to_value(group.stats()).unwrap();
        assert_eq!(json["loads"], 1);
        assert_eq!(json["cached_entries"], 1);
        assert_eq!(json["cached_bytes"], 7);
    }
}
