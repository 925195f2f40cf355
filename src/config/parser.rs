use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use link_sentry::config::load_config;
///
/// let config = load_config(Path::new("link-sentry.toml")).unwrap();
/// println!("Workers: {}", config.crawler.max_workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is printed in reports so two runs can be compared against the
/// exact settings they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Configuration written by [`write_default_config`]
pub const DEFAULT_CONFIG: &str = r##"# Link-Sentry configuration
start-url = "https://www.example.com/"

# Regexes (case-insensitive) excluding URLs from crawling and checking
exclude-patterns = [".*admin.*"]

# Regexes excluding URLs from checking only
exclude-check-patterns = []

include-external-links = true

[crawler]
max-workers = 3
delay-between-requests = 1.0
timeout = 30.0
max-retries = 3
retry-backoff = 1.0

[output]
report-dir = "."
write-html = true

[email]
enabled = false
smtp-server = "smtp.gmail.com"
smtp-port = 587
from-email = "your_email@example.com"
from-password = "your_app_password"
to-emails = ["your_email@example.com"]
subject = "Broken Links Report for {domain}"
"##;

/// Writes the default configuration to `path`
///
/// Refuses to overwrite an existing file.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())?;
    tracing::info!("Created default config file: {}", path.display());
    Ok(())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
