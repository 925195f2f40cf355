//! URL handling module for Link-Sentry
//!
//! This module provides URL canonicalization, domain extraction, exclusion
//! pattern matching, and the two-tier admission policy:
//!
//! - **crawl-eligible**: same site as the start URL and not matched by any
//!   general exclusion pattern. Such URLs may be fetched as pages.
//! - **check-eligible**: not matched by any general *or* check-specific
//!   exclusion pattern. Such URLs may be verified.

mod domain;
mod matcher;
mod normalize;

use crate::config::Config;
use crate::ConfigError;
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_authority, extract_domain, is_same_domain};
pub use matcher::PatternSet;
pub use normalize::canonicalize;

/// Whether a link points inside or outside the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same authority as the start URL
    Internal,
    /// Any other authority, or no parseable authority at all
    External,
}

impl LinkScope {
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl fmt::Display for LinkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission policy for one crawl run
///
/// Built once from the configuration; all patterns are compiled up front so
/// per-URL decisions never fail.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    start_url: Url,
    start_authority: String,
    exclusions: PatternSet,
    check_exclusions: PatternSet,
}

impl UrlPolicy {
    /// Builds the policy from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(UrlPolicy)` - Patterns compiled and start URL understood
    /// * `Err(ConfigError)` - Start URL has no host or a pattern is invalid
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let start_url = Url::parse(&config.start_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", config.start_url, e))
        })?;

        let start_authority = extract_authority(&start_url).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("start_url '{}' has no host", config.start_url))
        })?;

        Ok(Self {
            start_url,
            start_authority,
            exclusions: PatternSet::new(&config.exclude_patterns)?,
            check_exclusions: PatternSet::new(&config.exclude_check_patterns)?,
        })
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// The authority every internal link shares
    pub fn start_domain(&self) -> &str {
        &self.start_authority
    }

    /// Returns true if `url` has the same authority as the start URL
    pub fn is_same_domain(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| extract_authority(&u))
            .is_some_and(|authority| authority == self.start_authority)
    }

    /// Classifies a link relative to the start URL
    pub fn scope(&self, url: &str) -> LinkScope {
        if self.is_same_domain(url) {
            LinkScope::Internal
        } else {
            LinkScope::External
        }
    }

    /// Returns true if `url` may be fetched as a page
    pub fn is_crawl_eligible(&self, url: &str) -> bool {
        self.is_same_domain(url) && !self.exclusions.is_match(url)
    }

    /// Returns true if `url` may be verified
    ///
    /// Malformed URLs are never check-eligible.
    pub fn is_check_eligible(&self, url: &str) -> bool {
        if Url::parse(url).is_err() {
            return false;
        }
        !self.check_exclusions.is_match(url) && !self.exclusions.is_match(url)
    }
}
