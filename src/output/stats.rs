//! Crawl and sink statistics
//!
//! `CycleStats` describes one crawl cycle, `RunStatistics` accumulates them
//! over the life of the process. `SinkStatistics` summarizes everything a
//! SQLite sink has stored across runs.

use crate::crawler::WalkStop;
use crate::output::sqlite_output::SqliteSink;
use crate::output::traits::OutputResult;
use std::fmt;

/// Number of airlines listed by `print_statistics`
const TOP_AIRLINES: usize = 10;

/// Outcome of one crawl cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Feed pages fetched
    pub pages_fetched: usize,

    /// Incidents newer than the watermark
    pub incidents_seen: usize,

    /// Blocks skipped because no incident could be extracted
    pub skipped_blocks: usize,

    /// Records handed to the sink
    pub events_emitted: usize,

    /// Why the walk stopped, if it ran to completion
    pub stop: Option<WalkStop>,

    /// True if this cycle only positioned the watermark at the feed head
    pub primed: bool,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} new incidents, {} emitted",
            self.pages_fetched, self.incidents_seen, self.events_emitted
        )?;
        if self.skipped_blocks > 0 {
            write!(f, ", {} skipped", self.skipped_blocks)?;
        }
        if let Some(stop) = self.stop {
            write!(f, " (stopped: {})", stop)?;
        }
        Ok(())
    }
}

/// Totals across every cycle of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub pages_fetched: u64,
    pub incidents_seen: u64,
    pub events_emitted: u64,
}

impl RunStatistics {
    /// Adds a completed cycle
    pub fn record_cycle(&mut self, cycle: &CycleStats) {
        self.cycles += 1;
        self.pages_fetched += cycle.pages_fetched as u64;
        self.incidents_seen += cycle.incidents_seen as u64;
        self.events_emitted += cycle.events_emitted as u64;
    }

    /// Adds a failed cycle
    pub fn record_failure(&mut self) {
        self.cycles += 1;
        self.failed_cycles += 1;
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles ({} failed), {} pages, {} incidents, {} emitted",
            self.cycles,
            self.failed_cycles,
            self.pages_fetched,
            self.incidents_seen,
            self.events_emitted
        )
    }
}

/// Summary of a SQLite sink database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkStatistics {
    /// Total stored records
    pub total_events: u64,

    /// Distinct incident ids
    pub distinct_incidents: u64,

    /// Distinct incidents per incident type
    pub by_incident_type: Vec<(String, u64)>,

    /// Airlines with the most incidents
    pub top_airlines: Vec<(String, u64)>,
}

/// Loads statistics from a SQLite sink
pub fn load_statistics(sink: &SqliteSink) -> OutputResult<SinkStatistics> {
    Ok(SinkStatistics {
        total_events: sink.count_events()?,
        distinct_incidents: sink.count_distinct_incidents()?,
        by_incident_type: sink.counts_by_incident_type()?,
        top_airlines: sink.top_airlines(TOP_AIRLINES)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SinkStatistics) {
    println!("=== Incident Statistics ===\n");

    println!("Overview:");
    println!("  Records emitted: {}", stats.total_events);
    println!("  Distinct incidents: {}", stats.distinct_incidents);
    println!();

    if !stats.by_incident_type.is_empty() {
        println!("Incidents by Type:");
        for (kind, count) in &stats.by_incident_type {
            let percentage = if stats.distinct_incidents > 0 {
                (*count as f64 / stats.distinct_incidents as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", kind, count, percentage);
        }
        println!();
    }

    if !stats.top_airlines.is_empty() {
        println!("Top Airlines ({}):", stats.top_airlines.len());
        for (airline, count) in &stats.top_airlines {
            println!("  - {}: {}", airline, count);
        }
    }
}
