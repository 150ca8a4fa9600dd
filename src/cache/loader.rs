//! Loaders - the source of truth behind a group
//!
//! A loader produces the bytes for a key on a cache miss. It can be a
//! stateful implementation (a database client, a remote store) or a plain
//! closure wrapped in [`LoaderFn`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::error::Error;

/// Opaque loader failure
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Produces the value for a key on a cache miss
pub trait Loader: Send + Sync {
    /// Load the bytes for `key`
    fn load(&self, key: &str) -> Result<Vec<u8>, LoadError>;
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        (**self).load(key)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        (**self).load(key)
    }
}

/// Adapter turning a closure into a [`Loader`]
pub struct LoaderFn<F>(F);

impl<F> LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, LoadError> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Loader for LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, LoadError> + Send + Sync,
{
    fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        (self.0)(key)
    }
}

/// Shorthand for [`LoaderFn::new`]
pub fn loader_fn<F>(f: F) -> LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, LoadError> + Send + Sync,
{
    LoaderFn::new(f)
}

/// Loader over an in-memory key/value table that counts loads per key
#[derive(Debug, Default)]
pub struct MapLoader {
    /// Backing records
    records: HashMap<String, String>,
    /// Successful loads per key
    load_counts: DashMap<String, u64>,
}

impl MapLoader {
    /// Create a loader over the given records
    pub fn new(records: HashMap<String, String>) -> Self {
        Self {
            records,
            load_counts: DashMap::new(),
        }
    }

    /// Read records from a JSON or YAML file (chosen by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|ext| ext.to_str());
        let records: HashMap<String, String> = match extension {
            Some("json") => serde_json::from_str(&raw).map_err(|e| parse_error(path, e))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&raw).map_err(|e| parse_error(path, e))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported data file extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };

        Ok(Self::new(records))
    }

    /// Number of successful loads for `key`
    pub fn load_count(&self, key: &str) -> u64 {
        self.load_counts.get(key).map(|count| *count).unwrap_or(0)
    }

    /// Successful loads across all keys
    pub fn total_loads(&self) -> u64 {
        self.load_counts.iter().map(|entry| *entry.value()).sum()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MapLoader
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

impl Loader for MapLoader {
    fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        info!(key, "[loader] search key");
        match self.records.get(key) {
            Some(value) => {
                *self.load_counts.entry(key.to_string()).or_insert(0) += 1;
                Ok(value.clone().into_bytes())
            }
            None => Err(format!("{} not exist", key).into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
