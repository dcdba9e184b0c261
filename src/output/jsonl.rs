//! JSON lines sink
//!
//! Writes one JSON object per line, either to standard output or appended to
//! a file.

use crate::output::traits::{IncidentEvent, IncidentSink, OutputError, OutputResult};
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Sink writing newline-delimited JSON records
pub struct JsonLinesSink {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    /// Writes records to standard output
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(io::stdout()))
    }

    /// Appends records to the file at `path`, creating it if needed
    pub fn append(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    /// Writes records to an arbitrary writer
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl IncidentSink for JsonLinesSink {
    fn emit(&mut self, event: &IncidentEvent) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, event).map_err(|e| {
            if e.is_io() {
                OutputError::Io(e.into())
            } else {
                OutputError::Serialization(e)
            }
        })?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
