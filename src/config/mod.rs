//! Configuration module for Link-Sentry
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use link_sentry::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("link-sentry.toml")).unwrap();
//! println!("Crawling from: {}", config.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, EmailConfig, OutputConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, write_default_config,
    DEFAULT_CONFIG,
};
pub use validation::validate;
