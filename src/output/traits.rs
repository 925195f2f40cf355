//! Report types and the report sink trait
//!
//! The crawl engine produces a [`RunSummary`] and a list of
//! [`BrokenLinkRecord`]s. Everything that turns those into files, console
//! output or notifications implements [`ReportSink`].

use crate::crawler::LinkKind;
use crate::url::LinkScope;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to send email: {0}")]
    Email(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One broken reference found during the crawl
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLinkRecord {
    /// The page the reference was found on
    pub source_page: String,

    /// The broken URL, absolute
    pub url: String,

    /// Display text of the reference (at most 100 characters)
    pub text: String,

    /// Title attribute of the reference, empty if absent
    pub title: String,

    /// What kind of element carried the reference
    pub kind: LinkKind,

    /// HTTP status code, or 0 when the request never got a response
    pub status_code: u16,

    /// Reason phrase or transport error description
    pub error: String,

    /// Internal or external relative to the start URL
    pub scope: LinkScope,

    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
}

impl BrokenLinkRecord {
    /// Returns true if the request failed below HTTP (DNS, refused, timeout)
    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }
}

/// Aggregate numbers for one crawl run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub start_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Distinct pages dequeued and processed
    pub pages_visited: usize,

    /// Distinct external URLs dispatched for verification
    pub external_links_checked: usize,

    pub broken_links: usize,
    pub internal_broken: usize,
    pub external_broken: usize,

    /// True if the run stopped early on an interrupt
    pub interrupted: bool,

    /// SHA-256 of the configuration file, when loaded from one
    pub config_hash: Option<String>,
}

impl RunSummary {
    /// Builds a summary, deriving the broken-link counts from `findings`
    pub fn new(
        start_url: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        pages_visited: usize,
        external_links_checked: usize,
        findings: &[BrokenLinkRecord],
        interrupted: bool,
    ) -> Self {
        let external_broken = findings.iter().filter(|r| r.scope.is_external()).count();

        Self {
            start_url: start_url.into(),
            started_at,
            finished_at,
            pages_visited,
            external_links_checked,
            broken_links: findings.len(),
            internal_broken: findings.len() - external_broken,
            external_broken,
            interrupted,
            config_hash: None,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn is_clean(&self) -> bool {
        self.broken_links == 0
    }
}

/// Trait for report sinks
///
/// A sink receives the finished run exactly once. Implementations decide
/// where the report goes (file, console, mail relay).
pub trait ReportSink {
    /// Emits the report for a finished run
    ///
    /// # Arguments
    ///
    /// * `summary` - Aggregate run numbers
    /// * `findings` - Broken links in the order they were recorded
    fn emit(&self, summary: &RunSummary, findings: &[BrokenLinkRecord]) -> OutputResult<()>;
}
