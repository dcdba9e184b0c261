//! Crawler module for watching the incident feed
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of feed pages
//! - Locating incident blocks and the next-page link
//! - Extracting structured incidents from each block
//! - Walking back through pages until the watermark
//! - Scheduling crawl cycles and emitting new incidents

mod extractor;
mod fetcher;
mod parser;
mod scheduler;
mod walker;

pub use extractor::{extract_incident, parse_narrative};
pub use fetcher::{build_http_client, Fetcher};
pub use parser::{parse_page, ParsedPage, HEADLINE_CLASS};
pub use scheduler::Scheduler;
pub use walker::{WalkResult, WalkStop, Walker};

use crate::config::Config;
use crate::output::{open_sink, CycleStats};
use crate::storage::open_state_store;
use crate::WatchError;
use tokio_util::sync::CancellationToken;

/// Builds a scheduler from the configuration, with the configured state
/// store and output sink
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `fresh` - Ignore any persisted watermark and apply the start position
pub fn build_scheduler(config: &Config, fresh: bool) -> Result<Scheduler, WatchError> {
    let store = open_state_store(&config.state.resolved_path());
    let sink = open_sink(&config.output)?;
    Scheduler::new(config, Box::new(store), sink, fresh)
}

/// Runs the watcher until `shutdown` is cancelled, then persists the watermark
///
/// # Returns
///
/// * `Ok(())` - Stopped cleanly and the watermark was saved
/// * `Err(WatchError)` - A non-retryable failure, or the final save failed
pub async fn watch(
    config: &Config,
    fresh: bool,
    shutdown: CancellationToken,
) -> Result<(), WatchError> {
    let mut scheduler = build_scheduler(config, fresh)?;
    let outcome = scheduler.run(shutdown).await;
    let saved = scheduler.shutdown();
    outcome.and(saved)
}

/// Runs a single crawl cycle and persists the watermark
pub async fn watch_once(config: &Config, fresh: bool) -> Result<CycleStats, WatchError> {
    let mut scheduler = build_scheduler(config, fresh)?;
    let cycle = scheduler.run_cycle().await;
    scheduler.shutdown()?;
    cycle
}
