use crate::config::types::{Config, CrawlerConfig, EmailConfig};
use crate::url::PatternSet;
use crate::ConfigError;
use lettre::Address;
use std::time::Duration;
use url::Url;

/// Upper bound on the verification pool; more workers only hammer the target
const MAX_WORKERS: usize = 64;

/// Upper bound on every duration setting (one day)
const MAX_SECONDS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;
    validate_patterns(&config.exclude_patterns)?;
    validate_patterns(&config.exclude_check_patterns)?;
    validate_crawler_config(&config.crawler)?;
    validate_email_config(&config.email)?;
    Ok(())
}

/// Validates the start URL: must parse, be HTTP(S) and carry a host
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' must use http or https, got '{}'",
            start_url,
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' has no host",
            start_url
        )));
    }

    Ok(())
}

/// Validates that every exclusion pattern compiles
fn validate_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    PatternSet::new(patterns).map(|_| ())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    check_seconds("delay_between_requests", config.delay_between_requests, true)?;
    check_seconds("timeout", config.timeout, false)?;
    check_seconds("retry_backoff", config.retry_backoff, true)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates email settings; nothing is checked while email is disabled
fn validate_email_config(config: &EmailConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.smtp_server.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.smtp_server cannot be empty".to_string(),
        ));
    }

    if config.smtp_port == 0 {
        return Err(ConfigError::Validation(
            "email.smtp_port must be non-zero".to_string(),
        ));
    }

    if config.to_emails.is_empty() {
        return Err(ConfigError::Validation(
            "email.to_emails needs at least one recipient".to_string(),
        ));
    }

    for address in std::iter::once(&config.from_email).chain(&config.to_emails) {
        address.parse::<Address>().map_err(|e| {
            ConfigError::Validation(format!("Invalid email address '{}': {}", address, e))
        })?;
    }

    Ok(())
}

/// Checks a duration setting is finite, in range and convertible
fn check_seconds(name: &str, value: f64, allow_zero: bool) -> Result<(), ConfigError> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };

    if !value.is_finite() || !lower_ok || value > MAX_SECONDS {
        let bound = if allow_zero { ">=" } else { ">" };
        return Err(ConfigError::Validation(format!(
            "{} must be {} 0 and at most {} seconds, got {}",
            name, bound, MAX_SECONDS, value
        )));
    }

    if Duration::try_from_secs_f64(value).is_err() {
        return Err(ConfigError::Validation(format!(
            "{} is not a representable duration: {}",
            name, value
        )));
    }

    Ok(())
}
