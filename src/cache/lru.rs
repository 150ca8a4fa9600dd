//! LRU Eviction Cache
//!
//! Byte-bounded key/value store that evicts the least recently used entry
//! once the configured budget is exceeded.
//!
//! # Design
//!
//! - Entries live in a slot arena; recency is an intrusive doubly-linked list
//!   threaded through the slots by index (head = most recent, tail = oldest)
//! - A `HashMap<String, usize>` maps each key to its slot for O(1) lookup
//! - Vacated slots are pushed on a free list and reused by the next insert
//! - Every entry is charged `key.len() + value.size()` bytes
//!
//! The cache is single-owner: every operation takes `&mut self`. Wrap it in
//! [`SyncCache`](super::SyncCache) for shared access.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

/// A value whose byte footprint counts against the cache budget
pub trait SizedValue {
    /// Logical size in bytes
    fn size(&self) -> usize;
}

impl SizedValue for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }
}

impl SizedValue for String {
    fn size(&self) -> usize {
        self.len()
    }
}

impl SizedValue for bytes::Bytes {
    fn size(&self) -> usize {
        self.len()
    }
}

/// Hook invoked with every evicted entry
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

/// Sentinel slot index for "no neighbour"
const NIL: usize = usize::MAX;

struct Node<V> {
    key: String,
    value: V,
    prev: usize,
    next: usize,
}

/// Byte-bounded LRU cache
pub struct LruCache<V> {
    /// Slot arena (None = free slot)
    slots: Vec<Option<Node<V>>>,
    /// Free slot indices
    free: Vec<usize>,
    /// Key -> slot index
    index: HashMap<String, usize>,
    /// Most recently used slot
    head: usize,
    /// Least recently used slot
    tail: usize,
    /// Sum of key.len() + value.size() over live entries
    used_bytes: i64,
    /// Budget in bytes (<= 0 = unbounded)
    max_bytes: i64,
    /// Optional eviction hook
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: SizedValue> LruCache<V> {
    /// Create an empty cache with the given byte budget
    pub fn new(max_bytes: i64) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
            used_bytes: 0,
            max_bytes,
            on_evicted: None,
        }
    }

    /// Create an empty cache that reports evictions to `callback`
    pub fn with_eviction_callback<F>(max_bytes: i64, callback: F) -> Self
    where
        F: FnMut(&str, &V) + Send + 'static,
    {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(Box::new(callback));
        cache
    }

    /// Look up a key, marking it most recently used on a hit
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    /// Look up a key without touching recency
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace a value, then evict from the tail until the budget holds
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.slots[idx].as_mut() {
                let new_size = value.size() as i64;
                let old = std::mem::replace(&mut node.value, value);
                self.used_bytes += new_size - old.size() as i64;
            }
            self.move_to_front(idx);
        } else {
            self.used_bytes += (key.len() + value.size()) as i64;
            let idx = self.alloc(Node {
                key: key.clone(),
                value,
                prev: NIL,
                next: NIL,
            });
            self.index.insert(key, idx);
            self.push_front(idx);
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    /// Evict the least recently used entry, invoking the eviction hook
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        if self.tail == NIL {
            return None;
        }

        let (key, value) = self.detach(self.tail)?;
        debug!(key = %key, size = value.size(), "evicted least recently used entry");

        if let Some(callback) = self.on_evicted.as_mut() {
            callback(&key, &value);
        }

        Some((key, value))
    }

    /// Remove a key explicitly (not reported as an eviction)
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = *self.index.get(key)?;
        self.detach(idx).map(|(_, value)| value)
    }

    /// Drop every entry without reporting evictions
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
        self.used_bytes = 0;
    }

    /// Keys ordered from most to least recently used
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.index.len());
        let mut cursor = self.head;
        while let Some(node) = self.slots.get(cursor).and_then(Option::as_ref) {
            keys.push(node.key.clone());
            cursor = node.next;
        }
        keys
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged against the budget
    pub fn used_bytes(&self) -> i64 {
        self.used_bytes
    }

    /// Configured budget (<= 0 = unbounded)
    pub fn max_bytes(&self) -> i64 {
        self.max_bytes
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Unlink a slot, free it and settle the byte accounting
    fn detach(&mut self, idx: usize) -> Option<(String, V)> {
        self.unlink(idx);
        let node = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        self.index.remove(&node.key);
        self.used_bytes -= (node.key.len() + node.value.size()) as i64;
        Some((node.key, node.value))
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots.get(idx).and_then(Option::as_ref) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        if prev == NIL {
            self.head = next;
        } else if let Some(node) = self.slots[prev].as_mut() {
            node.next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else if let Some(node) = self.slots[next].as_mut() {
            node.prev = prev;
        }

        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = NIL;
            node.next = NIL;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }

        if old_head == NIL {
            self.tail = idx;
        } else if let Some(node) = self.slots[old_head].as_mut() {
            node.prev = idx;
        }

        self.head = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("entries", &self.index.len())
            .field("used_bytes", &self.used_bytes)
            .field("max_bytes", &self.max_bytes)
            .field("has_eviction_callback", &self.on_evicted.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
