//! Output module for emitting incidents downstream
//!
//! This module handles:
//! - The `IncidentSink` trait and the `IncidentEvent` record
//! - JSON lines output to stdout or a file
//! - SQLite output and the statistics read back from it
//! - An in-process channel sink for embedding the watcher

mod channel;
mod jsonl;
mod sqlite_output;
pub mod stats;
mod traits;

pub use channel::ChannelSink;
pub use jsonl::JsonLinesSink;
pub use sqlite_output::SqliteSink;
pub use stats::{load_statistics, print_statistics, CycleStats, RunStatistics, SinkStatistics};
pub use traits::{IncidentEvent, IncidentSink, OutputError, OutputResult};

use crate::config::{OutputConfig, OutputKind};
use std::path::Path;

/// Opens the sink selected by the `[output]` configuration section
///
/// # Returns
///
/// * `Ok(Box<dyn IncidentSink + Send>)` - The opened sink
/// * `Err(OutputError)` - The target file could not be opened, or a
///   file-backed sink has no path
pub fn open_sink(config: &OutputConfig) -> OutputResult<Box<dyn IncidentSink + Send>> {
    let path = || {
        config
            .path
            .as_deref()
            .map(Path::new)
            .ok_or_else(|| OutputError::Write("output.path is required for this sink".to_string()))
    };

    let sink: Box<dyn IncidentSink + Send> = match config.kind {
        OutputKind::Stdout => Box::new(JsonLinesSink::stdout()),
        OutputKind::Jsonl => Box::new(JsonLinesSink::append(path()?)?),
        OutputKind::Sqlite => Box::new(SqliteSink::open(path()?)?),
    };

    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_file_sinks() {
        let dir = TempDir::new().unwrap();

        for kind in [OutputKind::Jsonl, OutputKind::Sqlite] {
            let config = OutputConfig {
                kind,
                path: Some(dir.path().join(format!("{:?}", kind)).display().to_string()),
            };
            assert!(open_sink(&config).is_ok());
        }
    }

    #[test]
    fn test_file_sink_requires_path() {
        let config = OutputConfig {
            kind: OutputKind::Sqlite,
            path: None,
        };
        assert!(matches!(open_sink(&config), Err(OutputError::Write(_))));
    }
}
