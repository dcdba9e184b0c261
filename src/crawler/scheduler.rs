//! Crawl scheduler
//!
//! Owns the watermark and drives one crawl cycle per tick: walk the feed,
//! filter the new incidents oldest first, emit them, then advance and
//! persist the watermark. Cycles never overlap.

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::walker::{WalkStop, Walker};
use crate::filter::FilterCriteria;
use crate::incident::Incident;
use crate::output::{CycleStats, IncidentEvent, IncidentSink, RunStatistics};
use crate::state::{CrawlWatermark, StartPosition};
use crate::storage::StateStore;
use crate::url::parse_root_url;
use crate::WatchError;
use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Polls the feed and emits every new incident exactly once
pub struct Scheduler {
    walker: Walker,
    criteria: FilterCriteria,
    store: Box<dyn StateStore + Send>,
    sink: Box<dyn IncidentSink + Send>,
    watermark: CrawlWatermark,
    /// Set until the first successful cycle when starting from the feed head
    priming: Option<StartPosition>,
    poll_interval: Duration,
    page_limit: usize,
    stats: RunStatistics,
}

impl Scheduler {
    /// Creates a scheduler and resolves where crawling starts
    ///
    /// A persisted watermark is resumed unless `fresh` is set. Otherwise the
    /// configured start position decides: `beginning` backfills the whole
    /// feed, `end` and `last` position at the feed head on the first cycle,
    /// and an explicit id becomes the initial watermark.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `store` - Where the watermark is persisted
    /// * `sink` - Where accepted incidents are emitted
    /// * `fresh` - Ignore any persisted watermark
    ///
    /// # Returns
    ///
    /// * `Ok(Scheduler)` - Ready to run
    /// * `Err(WatchError)` - The root URL or the HTTP client is invalid
    pub fn new(
        config: &Config,
        store: Box<dyn StateStore + Send>,
        sink: Box<dyn IncidentSink + Send>,
        fresh: bool,
    ) -> Result<Self, WatchError> {
        let root = parse_root_url(&config.crawler.root_url)?;
        let fetcher = Fetcher::new(&config.crawler)?;

        let persisted = if fresh {
            tracing::info!("Fresh start requested, ignoring persisted watermark");
            None
        } else {
            match store.load() {
                Ok(watermark) => watermark.filter(|w| !w.is_empty()),
                Err(e) => {
                    tracing::warn!("Failed to load watermark, starting without one: {}", e);
                    None
                }
            }
        };

        let (watermark, priming) = match persisted {
            Some(watermark) => {
                tracing::info!("Resuming from watermark {}", watermark);
                (watermark, None)
            }
            None => resolve_start(&config.crawler.start_position),
        };

        let criteria = FilterCriteria::from_config(&config.filter);
        if criteria.is_unrestricted() {
            tracing::debug!("No filter criteria configured, every incident is emitted");
        }

        Ok(Self {
            walker: Walker::new(fetcher, root),
            criteria,
            store,
            sink,
            watermark,
            priming,
            poll_interval: Duration::from_secs(config.crawler.poll_interval),
            page_limit: config.crawler.max_pages as usize,
            stats: RunStatistics::default(),
        })
    }

    /// Returns the current watermark
    pub fn watermark(&self) -> &CrawlWatermark {
        &self.watermark
    }

    /// Returns the statistics accumulated by `run`
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Returns true while the first cycle still has to position at the feed head
    pub fn is_priming(&self) -> bool {
        self.priming.is_some()
    }

    /// Runs one crawl cycle
    ///
    /// Only the page fetches await; once the walk has returned, filtering,
    /// emission and persistence run to completion.
    ///
    /// # Errors
    ///
    /// * `WatchError::Fetch` / `WatchError::Parse` - The walk failed; the
    ///   watermark is untouched
    /// * `WatchError::Output` - The sink failed; the watermark advanced to
    ///   the last incident fully emitted and flushed, and was persisted
    pub async fn run_cycle(&mut self) -> Result<CycleStats, WatchError> {
        if let Some(position) = self.priming.clone() {
            return self.prime(position).await;
        }

        let walk = self.walker.walk(&self.watermark, self.page_limit).await?;
        if walk.stop == WalkStop::PageLimit {
            tracing::warn!(
                "Stopped after {} pages without reaching watermark {}; older incidents are skipped",
                walk.pages_fetched,
                self.watermark
            );
        }

        let mut stats = CycleStats {
            pages_fetched: walk.pages_fetched,
            incidents_seen: walk.incidents.len(),
            skipped_blocks: walk.skipped_blocks,
            stop: Some(walk.stop),
            ..CycleStats::default()
        };

        let before = self.watermark.clone();
        let delivered = self.deliver(&walk.incidents, &mut stats);
        if self.watermark != before {
            self.persist();
        }
        delivered?;

        tracing::info!("Cycle complete: {}", stats);
        Ok(stats)
    }

    /// Runs crawl cycles until `shutdown` is cancelled
    ///
    /// Retryable cycle failures are logged and retried on the next tick.
    /// Cancellation interrupts an in-flight walk or the sleep between
    /// cycles.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), WatchError> {
        tracing::info!(
            "Polling {} every {}s",
            self.walker.root(),
            self.poll_interval.as_secs()
        );

        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => None,
                result = self.run_cycle() => Some(result),
            };

            match outcome {
                None => {
                    tracing::info!("Shutdown requested during crawl cycle");
                    break;
                }
                Some(Ok(cycle)) => self.stats.record_cycle(&cycle),
                Some(Err(e)) if e.is_retryable() => {
                    self.stats.record_failure();
                    tracing::warn!("Crawl cycle failed, retrying next tick: {}", e);
                }
                Some(Err(e)) => {
                    self.stats.record_failure();
                    tracing::error!("Crawl cycle failed: {}", e);
                    return Err(e);
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Run statistics: {}", self.stats);
        Ok(())
    }

    /// Persists the watermark before exit
    ///
    /// Unlike the saves after each cycle, a failure here is returned.
    pub fn shutdown(&mut self) -> Result<(), WatchError> {
        self.store.save(&self.watermark)?;
        tracing::info!("Saved watermark {}", self.watermark);
        Ok(())
    }

    /// Positions the watermark at the newest incident on the first page
    async fn prime(&mut self, position: StartPosition) -> Result<CycleStats, WatchError> {
        let walk = self.walker.walk(&CrawlWatermark::empty(), 1).await?;

        let mut stats = CycleStats {
            pages_fetched: walk.pages_fetched,
            skipped_blocks: walk.skipped_blocks,
            stop: Some(walk.stop),
            primed: true,
            ..CycleStats::default()
        };

        let Some(newest) = walk.incidents.first() else {
            tracing::warn!("No usable incident on the first page, start position deferred");
            return Ok(stats);
        };

        if position == StartPosition::Last {
            stats.incidents_seen = 1;
            self.deliver(std::slice::from_ref(newest), &mut stats)?;
        } else {
            self.watermark.advance(&newest.id);
        }

        self.priming = None;
        self.persist();

        tracing::info!("Positioned at newest incident {}", self.watermark);
        Ok(stats)
    }

    /// Filters and emits incidents, oldest first, advancing the watermark
    ///
    /// `incidents` is newest first, as collected by the walker. Every
    /// incident moves the watermark once all of its records were accepted,
    /// including incidents the filter rejects. The watermark only moves past
    /// records a successful flush has covered: if no flush succeeds, it stays
    /// where it was.
    fn deliver(
        &mut self,
        incidents: &[Incident],
        stats: &mut CycleStats,
    ) -> Result<(), WatchError> {
        let observed_at = Utc::now();
        let root = self.walker.root().clone();
        let mut delivered = self.watermark.clone();

        for incident in incidents.iter().rev() {
            tracing::debug!("Incident {}: {}", incident.id, incident.headline_text);

            for matched_keyword in self.criteria.emissions(incident) {
                let event =
                    IncidentEvent::from_incident(incident, &root, matched_keyword, observed_at);

                if let Err(e) = self.sink.emit(&event) {
                    match self.sink.flush() {
                        Ok(()) => self.watermark = delivered,
                        Err(flush_error) => tracing::warn!(
                            "Failed to flush sink after emit error, watermark stays at {}: {}",
                            self.watermark,
                            flush_error
                        ),
                    }
                    return Err(e.into());
                }
                stats.events_emitted += 1;
            }

            delivered.advance(&incident.id);
        }

        self.sink.flush()?;
        self.watermark = delivered;
        Ok(())
    }

    /// Saves the watermark, logging failures
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.watermark) {
            tracing::warn!("Failed to persist watermark {}: {}", self.watermark, e);
        }
    }
}

/// Initial watermark and priming mode for a start position
fn resolve_start(position: &StartPosition) -> (CrawlWatermark, Option<StartPosition>) {
    tracing::info!("No persisted watermark, starting at {}", position);

    if position.primes_from_newest() {
        return (CrawlWatermark::empty(), Some(position.clone()));
    }

    match position {
        StartPosition::Id(id) => (CrawlWatermark::new(id.as_str()), None),
        _ => (CrawlWatermark::empty(), None),
    }
}
