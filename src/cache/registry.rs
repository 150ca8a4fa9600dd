//! Group Registry
//!
//! Name-indexed set of groups for processes serving several namespaces.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::info;

use super::group::Group;

static GLOBAL: Lazy<GroupRegistry> = Lazy::new(GroupRegistry::new);

/// Concurrent name -> group map
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: DashMap<String, Arc<Group>>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> &'static GroupRegistry {
        &GLOBAL
    }

    /// Register a group under its own name, returning any group it replaced
    pub fn register(&self, group: Group) -> (Arc<Group>, Option<Arc<Group>>) {
        let group = Arc::new(group);
        let previous = self
            .groups
            .insert(group.name().to_string(), Arc::clone(&group));
        info!(
            group = group.name(),
            cache_bytes = group.cache_bytes(),
            replaced = previous.is_some(),
            "registered group"
        );
        (group, previous)
    }

    /// Look up a group by name
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a group by name
    pub fn remove(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.remove(name).map(|(_, group)| group)
    }

    /// Registered group names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Get number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no groups are registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
