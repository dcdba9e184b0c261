//! SQLite-based incident sink
//!
//! Every emitted record becomes one row of the `incidents` table. Keyword
//! fan-out and re-emission after a failed cycle may both produce several
//! rows for one incident, so `incident_id` is indexed but not unique.

use crate::output::traits::{IncidentEvent, IncidentSink, OutputResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the sink database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS incidents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_id TEXT NOT NULL,
    headline TEXT NOT NULL,
    url TEXT NOT NULL,
    model TEXT,
    airline TEXT,
    city TEXT,
    date_text TEXT,
    reason_text TEXT,
    incident_type TEXT,
    matched_keyword TEXT,
    observed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_incidents_incident_id ON incidents(incident_id);
CREATE INDEX IF NOT EXISTS idx_incidents_airline ON incidents(airline);
"#;

/// Sink storing records in a SQLite database
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the sink database at `path`
    pub fn open(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Counts stored records
    pub fn count_events(&self) -> OutputResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Counts distinct incidents among the stored records
    pub fn count_distinct_incidents(&self) -> OutputResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT incident_id) FROM incidents",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Distinct incidents per incident type, most frequent first
    pub fn counts_by_incident_type(&self) -> OutputResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT COALESCE(incident_type, 'unknown'), COUNT(DISTINCT incident_id) AS n
             FROM incidents GROUP BY 1 ORDER BY n DESC, 1 ASC",
            None,
        )
    }

    /// Airlines with the most distinct incidents, most frequent first
    pub fn top_airlines(&self, limit: usize) -> OutputResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT airline, COUNT(DISTINCT incident_id) AS n
             FROM incidents WHERE airline IS NOT NULL
             GROUP BY airline ORDER BY n DESC, airline ASC LIMIT ?1",
            Some(limit as i64),
        )
    }

    fn grouped_counts(&self, sql: &str, limit: Option<i64>) -> OutputResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, u64)> {
            let key: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((key, count as u64))
        };

        let rows = match limit {
            Some(limit) => stmt.query_map(params![limit], map_row)?,
            None => stmt.query_map([], map_row)?,
        };

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

impl IncidentSink for SqliteSink {
    fn emit(&mut self, event: &IncidentEvent) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO incidents (
                incident_id, headline, url, model, airline, city,
                date_text, reason_text, incident_type, matched_keyword, observed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                event.id,
                event.headline,
                event.url,
                event.model,
                event.airline,
                event.city,
                event.date_text,
                event.reason_text,
                event.incident_type,
                event.matched_keyword,
                event.observed_at,
            ],
        )?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        // Each insert commits on its own.
        Ok(())
    }
}
