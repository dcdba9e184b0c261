use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, OutputKind, StateConfig,
};
use crate::state::StartPosition;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_state_config(&config.state)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let root = Url::parse(&config.root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url: {}", e)))?;

    if root.scheme() != "http" && root.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' must use http or https",
            config.root_url
        )));
    }

    if config.poll_interval < 1 || config.poll_interval > 86_400 {
        return Err(ConfigError::Validation(format!(
            "poll-interval must be between 1 and 86400 seconds, got {}",
            config.poll_interval
        )));
    }

    if config.fetch_timeout < 1 || config.fetch_timeout > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout must be between 1 and 300 seconds, got {}",
            config.fetch_timeout
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if let StartPosition::Id(id) = &config.start_position {
        if id.chars().any(|c| c.is_whitespace() || c == '&' || c == '#') {
            return Err(ConfigError::Validation(format!(
                "start-position id '{}' contains invalid characters",
                id
            )));
        }
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates state configuration
fn validate_state_config(config: &StateConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.sincedb_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sincedb-path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates filter criteria
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    validate_values("airline", &config.airline)?;
    validate_values("model", &config.model)?;
    validate_values("city", &config.city)?;
    validate_values("keywords", &config.keywords)?;

    // Keywords are matched against single whitespace-delimited tokens
    if let Some(keyword) = config
        .keywords
        .iter()
        .find(|k| k.split_whitespace().count() > 1)
    {
        return Err(ConfigError::Validation(format!(
            "keyword '{}' must be a single word",
            keyword
        )));
    }

    Ok(())
}

/// Validates that a list of filter values has no blank entries
fn validate_values(name: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "filter.{} cannot contain empty values",
            name
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let needs_path = matches!(config.kind, OutputKind::Jsonl | OutputKind::Sqlite);
    let has_path = config
        .path
        .as_deref()
        .map(|p| !p.trim().is_empty())
        .unwrap_or(false);

    if needs_path && !has_path {
        return Err(ConfigError::Validation(format!(
            "output.path is required for the {:?} output",
            config.kind
        )));
    }

    Ok(())
}
