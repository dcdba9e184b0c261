//! Configuration module for avherald-watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use avherald_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("avherald.toml")).unwrap();
//! println!("Watching {}", config.crawler.root_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, OutputKind, StateConfig,
    DEFAULT_ROOT_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
