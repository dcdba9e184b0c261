//! Storage traits and error types

use crate::state::CrawlWatermark;
use thiserror::Error;

/// Errors that can occur while loading or saving crawl state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read state file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt state file {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl state backends
///
/// The scheduler is the only writer. Implementations must make `save`
/// all-or-nothing: after a crash `load` returns either the previous or the
/// new watermark, never a mix.
pub trait StateStore {
    /// Loads the persisted watermark
    ///
    /// # Returns
    ///
    /// * `Ok(Some(watermark))` - A watermark was persisted earlier
    /// * `Ok(None)` - Nothing has been persisted yet
    /// * `Err(StorageError)` - The state exists but cannot be read
    fn load(&self) -> StorageResult<Option<CrawlWatermark>>;

    /// Persists the watermark, replacing any previous value
    fn save(&mut self, watermark: &CrawlWatermark) -> StorageResult<()>;
}
