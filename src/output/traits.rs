//! Output sink traits and the emitted event record

use crate::incident::Incident;
use crate::url::detail_url;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors that can occur while emitting incidents downstream
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Downstream consumer is not keeping up")]
    Backpressure,

    #[error("Downstream consumer has gone away")]
    Closed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One downstream record for an accepted incident
///
/// Narrative fields are absent when the headline did not have the usual
/// shape. `matched_keyword` names the keyword that produced this record
/// when keyword filtering is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentEvent {
    pub headline: String,
    pub url: String,
    pub model: Option<String>,
    pub airline: Option<String>,
    pub city: Option<String>,
    pub date_text: Option<String>,
    pub reason_text: Option<String>,
    pub incident_type: Option<String>,
    pub id: String,
    pub matched_keyword: Option<String>,
    pub observed_at: String,
}

impl IncidentEvent {
    /// Builds the record emitted for an incident
    ///
    /// # Arguments
    ///
    /// * `incident` - The accepted incident
    /// * `root` - Site root the detail URL is built from
    /// * `matched_keyword` - Keyword that produced this record, if any
    /// * `observed_at` - When the crawl cycle saw the incident
    pub fn from_incident(
        incident: &Incident,
        root: &Url,
        matched_keyword: Option<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        let owned = |value: Option<&str>| value.map(str::to_string);

        Self {
            headline: incident.headline_text.clone(),
            url: detail_url(root, &incident.id),
            model: owned(incident.model()),
            airline: owned(incident.airline()),
            city: owned(incident.city()),
            date_text: owned(incident.date_text()),
            reason_text: owned(incident.reason_text()),
            incident_type: incident.incident_type.clone(),
            id: incident.id.clone(),
            matched_keyword,
            observed_at: observed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Trait for downstream incident sinks
///
/// `emit` is called once per record, oldest incident first. A failing
/// `emit` stops the cycle; records already accepted stay accepted.
pub trait IncidentSink {
    /// Hands one record to the sink
    fn emit(&mut self, event: &IncidentEvent) -> OutputResult<()>;

    /// Makes every record emitted so far durable or visible downstream
    fn flush(&mut self) -> OutputResult<()>;
}
