use crate::config::types::{Config, CrawlerConfig, FetcherConfig, OutputConfig};
use crate::job::{CHUNK_SIZE_RANGE, CONCURRENCY_RANGE};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates batch crawling settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !CONCURRENCY_RANGE.contains(&config.concurrency_limit) {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between {} and {}, got {}",
            CONCURRENCY_RANGE.start(),
            CONCURRENCY_RANGE.end(),
            config.concurrency_limit
        )));
    }

    if !CHUNK_SIZE_RANGE.contains(&config.chunk_size) {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be between {} and {}, got {}",
            CHUNK_SIZE_RANGE.start(),
            CHUNK_SIZE_RANGE.end(),
            config.chunk_size
        )));
    }

    if !(config.failure_threshold > 0.0 && config.failure_threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "failure_threshold must be in (0, 1], got {}",
            config.failure_threshold
        )));
    }

    if config.chunk_delay_min_ms > config.chunk_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "chunk_delay_min_ms ({}) cannot exceed chunk_delay_max_ms ({})",
            config.chunk_delay_min_ms, config.chunk_delay_max_ms
        )));
    }

    Ok(())
}

/// Validates HTTP fetcher settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.max_not_found_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_not_found_attempts must be >= 1, got {}",
            config.max_not_found_attempts
        )));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents cannot be empty".to_string(),
        ));
    }

    for agent in &config.user_agents {
        validate_header_value("user_agents", agent)?;
    }

    validate_header_value("cookie", &config.cookie)?;

    Ok(())
}

/// Validates output settings
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Header values must be visible ASCII (spaces and tabs allowed)
fn validate_header_value(field: &str, value: &str) -> Result<(), ConfigError> {
    if value
        .chars()
        .all(|c| c == ' ' || c == '\t' || c.is_ascii_graphic())
    {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{} contains characters not allowed in an HTTP header: '{}'",
            field, value
        )))
    }
}
