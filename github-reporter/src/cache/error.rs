//! Cache store error types.

use thiserror::Error;

/// Errors that can occur while persisting cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to read or write the cache file.
    #[error("Failed to access cache file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The cache file holds invalid JSON.
    #[error("Failed to parse cache file '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
