//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Managing the frontier queue and the visited set
//! - Coordinating fetching, link extraction and link checking
//! - Pacing between pages
//! - Handling interrupts
//! - Building the final run summary

use crate::config::{validate, Config};
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::parser::{extract_links, LinkReference};
use crate::crawler::scheduler::Scheduler;
use crate::output::{BrokenLinkRecord, RunSummary};
use crate::state::{CrawlTarget, RunPhase, RunState};
use crate::url::{canonicalize, UrlPolicy};
use crate::SentryError;
use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub summary: RunSummary,

    /// Broken links in the order they were found
    pub findings: Vec<BrokenLinkRecord>,
}

/// Main crawler coordinator structure
///
/// A coordinator drives exactly one run; `run` consumes it.
pub struct Coordinator {
    config: Config,
    policy: UrlPolicy,
    fetcher: Fetcher,
    state: RunState,
    cancel: CancellationToken,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration; validated here
    /// * `cancel` - Token that interrupts the run when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SentryError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self, SentryError> {
        validate(&config)?;

        let policy = UrlPolicy::new(&config)?;
        let fetcher = Fetcher::from_config(&config.crawler)?.with_cancel(cancel.clone());
        let state = RunState::new(config.start_url.clone());

        Ok(Self {
            config,
            policy,
            fetcher,
            state,
            cancel,
            config_hash: None,
        })
    }

    /// Attaches the configuration hash to the run summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Takes the next target from the frontier
    /// 2. Skips it if already visited or not crawl-eligible
    /// 3. Fetches the page and extracts its links
    /// 4. Verifies the links through the worker pool
    /// 5. Admits unseen crawl-eligible links to the frontier
    /// 6. Sleeps the pacing delay
    ///
    /// An interrupt stops the loop between steps; the outcome then covers
    /// everything found up to that point and is marked as interrupted.
    pub async fn run(mut self) -> Result<CrawlOutcome, SentryError> {
        let started_at = Utc::now();
        let start_time = std::time::Instant::now();

        if self.cancel.is_cancelled() {
            tracing::info!("Interrupted before start, nothing crawled");
            self.state.transition(RunPhase::Draining)?;
            return self.finish(started_at, true);
        }

        self.state.transition(RunPhase::Running)?;
        tracing::info!("Starting crawl from {}", self.config.start_url);

        let scheduler = Scheduler::start(
            self.fetcher.clone(),
            self.config.crawler.max_workers,
            self.config.crawler.delay(),
            self.config.include_external_links,
            self.cancel.clone(),
        );

        let mut interrupted = false;

        while let Some(target) = self.state.pop_frontier() {
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let canonical = match canonicalize(&target.url) {
                Ok(canonical) => canonical,
                Err(e) => {
                    tracing::debug!("Dropping uncanonicalizable URL {}: {}", target.url, e);
                    continue;
                }
            };

            if self.state.is_visited(&canonical) {
                continue;
            }

            if !self.policy.is_crawl_eligible(&target.url) {
                tracing::info!("Skipping excluded URL: {}", target.url);
                continue;
            }

            self.state.mark_visited(canonical);
            tracing::info!(
                "[{}] Crawling: {}",
                self.state.pages_visited(),
                target.url
            );

            self.process_page(&scheduler, &target).await;

            if self.state.pages_visited() % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {} broken links, {:.2} pages/sec",
                    self.state.pages_visited(),
                    self.state.frontier_len(),
                    self.state.findings().len(),
                    self.state.pages_visited() as f64 / elapsed.as_secs_f64()
                );
            }

            if !self.pause(self.config.crawler.delay()).await {
                interrupted = true;
                break;
            }
        }

        if interrupted {
            tracing::warn!(
                "Crawl interrupted with {} URLs left in frontier",
                self.state.frontier_len()
            );
        } else {
            tracing::info!("Frontier is empty, crawl complete");
        }

        self.state.transition(RunPhase::Draining)?;
        scheduler.shutdown().await;

        tracing::info!(
            "Crawl finished: {} pages crawled in {:?}",
            self.state.pages_visited(),
            start_time.elapsed()
        );

        self.finish(started_at, interrupted)
    }

    /// Processes a single page
    ///
    /// This method:
    /// 1. Fetches the page
    /// 2. Extracts links from HTML responses, relative to the final URL
    /// 3. Checks the links and records failures
    /// 4. Admits new pages to the frontier
    ///
    /// Fetch failures are logged and end processing of this page only.
    async fn process_page(&mut self, scheduler: &Scheduler, target: &CrawlTarget) {
        let page = self.fetcher.fetch_page(&target.url).await;

        if page.is_broken() {
            let reason = page.error().unwrap_or_default();
            match page.status_code() {
                0 => tracing::error!("Failed to fetch {}: {}", target.url, reason),
                code => tracing::warn!("Failed to fetch {}: HTTP {} {}", target.url, code, reason),
            }
            return;
        }

        let links = match page {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let base = Url::parse(&final_url)
                    .or_else(|_| Url::parse(&target.url))
                    .ok();
                match base {
                    Some(base) => extract_links(&body, &base),
                    None => Vec::new(),
                }
            }
            FetchResult::ContentMismatch { content_type, .. } => {
                tracing::debug!("Not HTML ({}), no links to extract: {}", content_type, target.url);
                return;
            }
            other => {
                tracing::debug!("Unexpected HTTP {} for {}", other.status_code(), target.url);
                return;
            }
        };

        tracing::debug!("Found {} links on {}", links.len(), target.url);
        if links.is_empty() {
            return;
        }

        let records = scheduler
            .check_page_links(&self.policy, &mut self.state, &target.url, &links)
            .await;
        self.state.record_findings(records);

        if self.cancel.is_cancelled() {
            return;
        }

        let admitted = self.admit_links(&target.url, &links);
        tracing::info!(
            "Added {} new URLs to queue. Queue size: {}",
            admitted,
            self.state.frontier_len()
        );
    }

    /// Queues every crawl-eligible, unvisited reference
    ///
    /// Duplicates may enter the frontier; they are dropped when dequeued.
    fn admit_links(&mut self, page_url: &str, links: &[LinkReference]) -> usize {
        let mut admitted = 0;

        for link in links {
            if !self.policy.is_crawl_eligible(&link.url) {
                continue;
            }
            let Ok(canonical) = canonicalize(&link.url) else {
                continue;
            };
            if self.state.is_visited(&canonical) {
                continue;
            }
            self.state
                .push_frontier(CrawlTarget::discovered(link.url.clone(), page_url));
            admitted += 1;
        }

        admitted
    }

    /// Sleeps between pages; returns false if interrupted
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn finish(
        mut self,
        started_at: chrono::DateTime<Utc>,
        interrupted: bool,
    ) -> Result<CrawlOutcome, SentryError> {
        self.state.transition(RunPhase::Done)?;

        let mut summary = RunSummary::new(
            self.config.start_url.clone(),
            started_at,
            Utc::now(),
            self.state.pages_visited(),
            self.state.external_links_checked(),
            self.state.findings(),
            interrupted,
        );
        if let Some(hash) = self.config_hash.take() {
            summary = summary.with_config_hash(hash);
        }

        Ok(CrawlOutcome {
            summary,
            findings: self.state.into_findings(),
        })
    }
}

/// Runs a complete crawl with the given configuration
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `cancel` - Token that interrupts the run when cancelled
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Summary and findings, possibly partial
/// * `Err(SentryError)` - Invalid configuration or setup failure
pub async fn run_crawl(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, SentryError> {
    Coordinator::new(config, cancel)?.run().await
}
