//! avherald-watch: an incremental watcher for aviation incident headlines
//!
//! This crate polls a single paginated incident feed, extracts structured
//! fields from each headline, filters them against configured criteria and
//! emits every new incident downstream once, tracking its position with a
//! durable watermark so restarts neither repeat nor skip incidents.

pub mod config;
pub mod crawler;
pub mod filter;
pub mod incident;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for avherald-watch operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("State persistence error: {0}")]
    Persist(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

impl WatchError {
    /// Returns true if the failure only affects the current crawl cycle
    /// and the next scheduled tick should simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Parse(_) | Self::Output(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a page from the upstream site
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised when a fetched page does not have the expected structure
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No incident blocks found on {url}")]
    NoIncidentBlocks { url: String },

    #[error("Cannot resolve next-page link '{href}': {message}")]
    NextLink { href: String, message: String },
}

/// Per-incident extraction failures
///
/// These never abort a crawl cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Incident block carries no article link")]
    MissingId,

    #[error("Headline does not match the narrative pattern: {headline}")]
    NarrativeMismatch { headline: String },
}

/// Result type alias for avherald-watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use filter::FilterCriteria;
pub use incident::{Incident, Narrative};
pub use state::{CrawlWatermark, StartPosition};
