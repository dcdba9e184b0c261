//! File-backed watermark store

use crate::state::CrawlWatermark;
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Watermark store backed by a one-line text file
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn write_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.display_path(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> StorageResult<Option<CrawlWatermark>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.display_path(),
                    source,
                })
            }
        };

        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        let Some(id) = lines.next() else {
            return Ok(None);
        };

        if lines.next().is_some() || id.split_whitespace().count() > 1 {
            return Err(StorageError::Corrupt {
                path: self.display_path(),
                message: "expected a single incident id".to_string(),
            });
        }

        Ok(Some(CrawlWatermark::new(id)))
    }

    fn save(&mut self, watermark: &CrawlWatermark) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let tmp = self.temp_path();
        let written = write_synced(&tmp, watermark).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            // Leave no stray temp file behind
            let _ = fs::remove_file(&tmp);
            return Err(self.write_error(e));
        }

        tracing::trace!("Saved watermark {} to {}", watermark, self.path.display());
        Ok(())
    }
}

fn write_synced(path: &Path, watermark: &CrawlWatermark) -> io::Result<()> {
    let mut file = File::create(path)?;
    if let Some(id) = watermark.last_id() {
        writeln!(file, "{}", id)?;
    }
    file.sync_all()
}
