//! Property-Based Tests for the LRU Cache
//!
//! # Test Properties
//!
//! 1. **Budget**: after every `add`, `used_bytes <= max_bytes` or the cache is empty
//! 2. **Accounting**: `used_bytes` always equals the sum of `key.len() + value.size()`
//! 3. **Recency**: eviction order matches a reference model of access order
//! 4. **Updates**: re-adding a key changes only the value's share of the bytes

#![cfg(test)]

use std::collections::VecDeque;

use proptest::prelude::*;

use super::lru::{LruCache, SizedValue};

// =============================================================================
// Property Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Add(String, Vec<u8>),
    Get(String),
    RemoveOldest,
    Remove(String),
}

/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,3}"
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (key_strategy(), prop::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(k, v)| Op::Add(k, v)),
        3 => key_strategy().prop_map(Op::Get),
        1 => Just(Op::RemoveOldest),
        1 => key_strategy().prop_map(Op::Remove),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..200)
}

/// Reference model: front = most recently used
#[derive(Default)]
struct Model {
    entries: VecDeque<(String, Vec<u8>)>,
}

impl Model {
    fn used(&self) -> i64 {
        self.entries
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as i64)
            .sum()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn touch(&mut self, key: &str) -> Option<Vec<u8>> {
        let idx = self.position(key)?;
        let entry = self.entries.remove(idx)?;
        let value = entry.1.clone();
        self.entries.push_front(entry);
        Some(value)
    }

    fn add(&mut self, key: String, value: Vec<u8>, max_bytes: i64) {
        if let Some(idx) = self.position(&key) {
            self.entries.remove(idx);
        }
        self.entries.push_front((key, value));
        while max_bytes > 0 && self.used() > max_bytes {
            self.entries.pop_back();
        }
    }
}

fn actual_used(cache: &LruCache<Vec<u8>>) -> i64 {
    cache
        .keys()
        .iter()
        .map(|k| (k.len() + cache.peek(k).map(SizedValue::size).unwrap_or(0)) as i64)
        .sum()
}

// =============================================================================
// Budget and Accounting Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the budget holds after every mutating call
    #[test]
    fn prop_budget_invariant(max_bytes in 1i64..256, ops in ops_strategy()) {
        let mut cache: LruCache<Vec<u8>> = LruCache::new(max_bytes);

        for op in ops {
            match op {
                Op::Add(k, v) => { cache.add(k, v); }
                Op::Get(k) => { cache.get(&k); }
                Op::RemoveOldest => { cache.remove_oldest(); }
                Op::Remove(k) => { cache.remove(&k); }
            }
            prop_assert!(cache.used_bytes() <= max_bytes || cache.is_empty());
        }
    }

    /// Property: incremental accounting never drifts from a full recount
    #[test]
    fn prop_accounting_matches_contents(max_bytes in -8i64..256, ops in ops_strategy()) {
        let mut cache: LruCache<Vec<u8>> = LruCache::new(max_bytes);

        for op in ops {
            match op {
                Op::Add(k, v) => { cache.add(k, v); }
                Op::Get(k) => { cache.get(&k); }
                Op::RemoveOldest => { cache.remove_oldest(); }
                Op::Remove(k) => { cache.remove(&k); }
            }
            prop_assert_eq!(cache.used_bytes(), actual_used(&cache));
            prop_assert_eq!(cache.keys().len(), cache.len());
        }
    }
}

// =============================================================================
// Recency Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: contents and order match the reference model
    #[test]
    fn prop_matches_reference_model(max_bytes in 0i64..128, ops in ops_strategy()) {
        let mut cache: LruCache<Vec<u8>> = LruCache::new(max_bytes);
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Add(k, v) => {
                    cache.add(k.clone(), v.clone());
                    model.add(k, v, max_bytes);
                }
                Op::Get(k) => {
                    let got = cache.get(&k).cloned();
                    prop_assert_eq!(got, model.touch(&k));
                }
                Op::RemoveOldest => {
                    let evicted = cache.remove_oldest().map(|(k, _)| k);
                    prop_assert_eq!(evicted, model.entries.pop_back().map(|(k, _)| k));
                }
                Op::Remove(k) => {
                    let removed = cache.remove(&k);
                    let expected = model.position(&k).and_then(|idx| model.entries.remove(idx)).map(|(_, v)| v);
                    prop_assert_eq!(removed, expected);
                }
            }

            let model_keys: Vec<String> = model.entries.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(cache.keys(), model_keys);
            prop_assert_eq!(cache.used_bytes(), model.used());
        }
    }

    /// Property: re-adding a key adjusts bytes by the value delta only
    #[test]
    fn prop_update_adjusts_value_delta(
        key in key_strategy(),
        first in prop::collection::vec(any::<u8>(), 0..64),
        second in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut cache: LruCache<Vec<u8>> = LruCache::new(0);
        cache.add(key.clone(), first.clone());
        let before = cache.used_bytes();

        cache.add(key.clone(), second.clone());

        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.used_bytes() - before, second.len() as i64 - first.len() as i64);
        prop_assert_eq!(cache.peek(&key), Some(&second));
    }
}
