//! Storage module for persisting crawl state
//!
//! The only durable state is the crawl watermark. It lives in a small text
//! file holding the id of the newest incident already seen, replaced
//! atomically on every save so a crash never leaves a torn file behind.

mod file;
mod traits;

pub use file::FileStateStore;
pub use traits::{StateStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the watermark store at the given path
///
/// Nothing is touched on disk until the first save.
pub fn open_state_store(path: &Path) -> FileStateStore {
    FileStateStore::new(path)
}
