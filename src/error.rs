//! Error types for the load-through cache

use std::sync::Arc;

use thiserror::Error;

/// Failure reported by a loader, shared so deduplicated callers can all see it
pub type SharedLoadError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while looking up or loading values
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup with an empty key
    #[error("key is required")]
    EmptyKey,

    /// Loader failure, surfaced exactly as the loader reported it
    #[error(transparent)]
    Loader(SharedLoadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data file could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
