//! Crawler module for page fetching and link checking
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - Link verification through a bounded worker pool
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod verifier;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, describe_transport_error, FetchResult, Fetcher, RetryPolicy};
pub use parser::{extract_links, LinkKind, LinkReference, MAX_TEXT_LEN, NO_TEXT};
pub use scheduler::{select_for_verification, BatchResults, Scheduler, VerificationPool};
pub use verifier::{verify_link, Verification};

use crate::config::Config;
use crate::SentryError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP client and start the verification workers
/// 3. Crawl every reachable same-site page
/// 4. Verify the links found on each page
/// 5. Return the summary and the broken links
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `cancel` - Cancelling this token stops the run gracefully
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl finished or was interrupted
/// * `Err(SentryError)` - Crawl could not start
pub async fn crawl(config: Config, cancel: CancellationToken) -> Result<CrawlOutcome, SentryError> {
    run_crawl(config, cancel).await
}
