use crate::state::StartPosition;
use serde::Deserialize;
use std::path::PathBuf;

/// Default site root of the incident feed
pub const DEFAULT_ROOT_URL: &str = "http://avherald.com/";

/// Browser-like user agent; the upstream site may reject default client signatures
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.6; rv:18.0) Gecko/20100101 Firefox/18.0";

/// File name of the default watermark file under the user's home directory
pub const DEFAULT_SINCEDB_FILE: &str = ".avherald_watch.sincedb";

/// Main configuration structure for avherald-watch
///
/// Every section is optional; a missing config file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl and polling behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL of the incident feed; pagination links resolve against it
    #[serde(rename = "root-url", default = "default_root_url")]
    pub root_url: String,

    /// Seconds to sleep between crawl cycles
    #[serde(rename = "poll-interval", default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Maximum number of feed pages fetched in one cycle
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Where to begin when no watermark has been persisted
    #[serde(rename = "start-position", default)]
    pub start_position: StartPosition,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_url: default_root_url(),
            poll_interval: default_poll_interval(),
            fetch_timeout: default_fetch_timeout(),
            max_pages: default_max_pages(),
            start_position: StartPosition::default(),
            user_agent: default_user_agent(),
        }
    }
}

/// Durable crawl state configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateConfig {
    /// Path of the file holding the watermark
    #[serde(rename = "sincedb-path")]
    pub sincedb_path: Option<String>,
}

impl StateConfig {
    /// Resolves the watermark file path
    ///
    /// Falls back to `$HOME/.avherald_watch.sincedb`, or the working
    /// directory when `HOME` is not set.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.sincedb_path {
            return PathBuf::from(path);
        }

        match std::env::var("HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_SINCEDB_FILE),
            _ => PathBuf::from(DEFAULT_SINCEDB_FILE),
        }
    }
}

/// Incident filter criteria; empty lists accept anything
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Accepted airlines
    #[serde(default)]
    pub airline: Vec<String>,

    /// Accepted aircraft models
    #[serde(default)]
    pub model: Vec<String>,

    /// Accepted cities or regions
    #[serde(default)]
    pub city: Vec<String>,

    /// Words looked up in the reason part of the headline
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Emit an incident once per matching keyword instead of once overall
    #[serde(rename = "keyword-fan-out", default = "default_keyword_fan_out")]
    pub keyword_fan_out: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            airline: Vec::new(),
            model: Vec::new(),
            city: Vec::new(),
            keywords: Vec::new(),
            keyword_fan_out: default_keyword_fan_out(),
        }
    }
}

/// Downstream sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// JSON lines on standard output
    #[default]
    Stdout,

    /// JSON lines appended to a file
    Jsonl,

    /// Rows in a SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Which sink receives emitted incidents
    #[serde(default)]
    pub kind: OutputKind,

    /// Target file for the `jsonl` and `sqlite` sinks
    pub path: Option<String>,
}

fn default_root_url() -> String {
    DEFAULT_ROOT_URL.to_string()
}

fn default_poll_interval() -> u64 {
    300
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    1000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_keyword_fan_out() -> bool {
    true
}
