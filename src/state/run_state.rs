use crate::output::BrokenLinkRecord;
use crate::state::RunPhase;
use crate::SentryError;
use std::collections::{HashSet, VecDeque};

/// A URL waiting in the frontier plus the page it was discovered on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The URL to fetch, as discovered (not canonicalized)
    pub url: String,

    /// The page that referenced this URL; `None` for the start URL
    pub found_on: Option<String>,
}

impl CrawlTarget {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            found_on: None,
        }
    }

    pub fn discovered(url: impl Into<String>, found_on: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            found_on: Some(found_on.into()),
        }
    }
}

/// All mutable state of one crawl run
///
/// Owned by a single coordinator. Verification workers never see this value;
/// they receive owned copies of the URLs they check, so no locking is needed.
#[derive(Debug)]
pub struct RunState {
    /// FIFO of pages still to fetch
    frontier: VecDeque<CrawlTarget>,

    /// Canonical URLs of pages already dequeued and processed
    visited: HashSet<String>,

    /// Canonical external URLs already dispatched for verification
    checked_external: HashSet<String>,

    /// Broken links found so far, in the order they were consumed
    findings: Vec<BrokenLinkRecord>,

    phase: RunPhase,
}

impl RunState {
    /// Creates the state for a run seeded with `start_url`
    pub fn new(start_url: impl Into<String>) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(CrawlTarget::seed(start_url));

        Self {
            frontier,
            visited: HashSet::new(),
            checked_external: HashSet::new(),
            findings: Vec::new(),
            phase: RunPhase::Idle,
        }
    }

    /// Moves the run to `next`, rejecting anything but a forward step
    pub fn transition(&mut self, next: RunPhase) -> Result<(), SentryError> {
        if !self.phase.can_transition_to(next) {
            return Err(SentryError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Run phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn pop_frontier(&mut self) -> Option<CrawlTarget> {
        self.frontier.pop_front()
    }

    pub fn push_frontier(&mut self, target: CrawlTarget) {
        self.frontier.push_back(target);
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_visited(&self, canonical: &str) -> bool {
        self.visited.contains(canonical)
    }

    /// Marks a page visited; returns false if it already was
    pub fn mark_visited(&mut self, canonical: String) -> bool {
        self.visited.insert(canonical)
    }

    pub fn pages_visited(&self) -> usize {
        self.visited.len()
    }

    /// Claims an external URL for verification
    ///
    /// Returns true exactly once per canonical URL per run.
    pub fn claim_external(&mut self, canonical: String) -> bool {
        self.checked_external.insert(canonical)
    }

    pub fn external_links_checked(&self) -> usize {
        self.checked_external.len()
    }

    pub fn record_findings(&mut self, records: Vec<BrokenLinkRecord>) {
        self.findings.extend(records);
    }

    pub fn findings(&self) -> &[BrokenLinkRecord] {
        &self.findings
    }

    /// Consumes the state, yielding the findings list
    pub fn into_findings(self) -> Vec<BrokenLinkRecord> {
        self.findings
    }
}
