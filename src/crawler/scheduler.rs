//! Link-check scheduling
//!
//! This module handles:
//! - Deciding which references on a page get verified
//! - A long-lived pool of verification workers fed through a bounded channel
//! - Consuming results in completion order with the pacing delay
//! - Turning failed verifications into broken-link records

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::LinkReference;
use crate::crawler::verifier::{verify_link, Verification};
use crate::output::BrokenLinkRecord;
use crate::state::RunState;
use crate::url::{canonicalize, UrlPolicy};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One URL to verify, with the channel its result goes back on
struct VerifyJob {
    index: usize,
    url: String,
    reply: mpsc::UnboundedSender<(usize, Verification)>,
}

/// A fixed set of verification workers
///
/// Workers are spawned once per run and pull jobs from a channel bounded to
/// the pool size, so at most `size` verifications are ever in flight. Once
/// the cancellation token fires, workers finish their current request and
/// drop everything still queued.
pub struct VerificationPool {
    jobs: mpsc::Sender<VerifyJob>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl VerificationPool {
    /// Spawns `size` workers sharing `fetcher`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(fetcher: Fetcher, size: usize, cancel: CancellationToken) -> Self {
        let size = size.max(1);
        let (jobs, receiver) = mpsc::channel::<VerifyJob>(size);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    fetcher.clone(),
                    Arc::clone(&receiver),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::debug!("Spawned {} verification workers", size);

        Self {
            jobs,
            workers,
            cancel,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a batch of URLs and returns a handle yielding their results
    ///
    /// Results arrive in completion order, tagged with the index of the URL
    /// in `urls`.
    pub fn dispatch(&self, urls: Vec<String>) -> BatchResults {
        let (reply, results) = mpsc::unbounded_channel();
        let jobs = self.jobs.clone();
        let cancel = self.cancel.clone();
        let pending = urls.len();

        // Feeding runs apart from consumption so the bounded channel can
        // apply backpressure without stalling the consumer
        tokio::spawn(async move {
            for (index, url) in urls.into_iter().enumerate() {
                let job = VerifyJob {
                    index,
                    url,
                    reply: reply.clone(),
                };
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = jobs.send(job) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        BatchResults {
            results,
            cancel: self.cancel.clone(),
            pending,
        }
    }

    /// Closes the job channel and waits for every worker to exit
    pub async fn shutdown(self) {
        drop(self.jobs);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!("Verification worker failed: {}", e);
            }
        }
        tracing::debug!("Verification workers stopped");
    }
}

/// Results of one dispatched batch
pub struct BatchResults {
    results: mpsc::UnboundedReceiver<(usize, Verification)>,
    cancel: CancellationToken,
    pending: usize,
}

impl BatchResults {
    /// Next finished verification, or `None` when the batch is exhausted
    /// or the run was cancelled
    pub async fn next(&mut self) -> Option<(usize, Verification)> {
        if self.pending == 0 {
            return None;
        }

        let next = tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = self.results.recv() => result,
        };

        if next.is_some() {
            self.pending -= 1;
        }
        next
    }
}

async fn worker_loop(
    id: usize,
    fetcher: Fetcher,
    jobs: Arc<Mutex<mpsc::Receiver<VerifyJob>>>,
    cancel: CancellationToken,
) {
    loop {
        let job = {
            let mut receiver = jobs.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                job = receiver.recv() => job,
            }
        };

        let Some(job) = job else {
            break;
        };

        if cancel.is_cancelled() {
            break;
        }

        tracing::trace!("Worker {} verifying {}", id, job.url);
        let verification = verify_link(&fetcher, &job.url).await;

        // The batch may have been abandoned; nothing to do then
        let _ = job.reply.send((job.index, verification));
    }
}

/// Picks the references on a page that need verifying
///
/// A reference is selected when it is check-eligible and either internal,
/// or external with external checking enabled and not yet claimed this run.
/// External URLs are claimed in `state` by their canonical form; internal
/// references are never deduplicated.
pub fn select_for_verification<'a>(
    policy: &UrlPolicy,
    state: &mut RunState,
    include_external: bool,
    references: &'a [LinkReference],
) -> Vec<&'a LinkReference> {
    let mut selected = Vec::new();

    for reference in references {
        if !policy.is_check_eligible(&reference.url) {
            tracing::trace!("Skipping check-excluded link: {}", reference.url);
            continue;
        }

        if policy.scope(&reference.url).is_external() {
            if !include_external {
                continue;
            }
            let key = canonicalize(&reference.url).unwrap_or_else(|_| reference.url.clone());
            if !state.claim_external(key) {
                continue;
            }
        }

        selected.push(reference);
    }

    selected
}

/// Verifies the links of each page and paces their consumption
pub struct Scheduler {
    pool: VerificationPool,
    include_external: bool,
    delay: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Starts the worker pool
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared HTTP client used by every worker
    /// * `max_workers` - Number of concurrent verifications
    /// * `delay` - Pause after each consumed result
    /// * `include_external` - Whether external links are verified at all
    /// * `cancel` - Run-wide interrupt token
    pub fn start(
        fetcher: Fetcher,
        max_workers: usize,
        delay: Duration,
        include_external: bool,
        cancel: CancellationToken,
    ) -> Self {
        let pool = VerificationPool::spawn(fetcher, max_workers, cancel.clone());
        tracing::info!(
            "Checking links with {} workers, {:?} between results",
            pool.size(),
            delay
        );

        Self {
            pool,
            include_external,
            delay,
            cancel,
        }
    }

    /// Verifies the references found on one page
    ///
    /// # Returns
    ///
    /// One record per failed verification, in the order results were
    /// consumed. On cancellation the records gathered so far are returned.
    pub async fn check_page_links(
        &self,
        policy: &UrlPolicy,
        state: &mut RunState,
        page_url: &str,
        references: &[LinkReference],
    ) -> Vec<BrokenLinkRecord> {
        let batch = select_for_verification(policy, state, self.include_external, references);
        if batch.is_empty() {
            return Vec::new();
        }

        tracing::info!("Checking {} links on {}", batch.len(), page_url);

        let urls = batch.iter().map(|r| r.url.clone()).collect();
        let mut results = self.pool.dispatch(urls);
        let mut records = Vec::new();

        while let Some((index, verification)) = results.next().await {
            let reference = batch[index];

            if verification.healthy {
                tracing::debug!("OK {} ({})", reference.url, verification.status_code);
            } else {
                let scope = policy.scope(&reference.url);
                tracing::warn!(
                    "Broken {} link: {} (status {}, {})",
                    scope,
                    reference.url,
                    verification.status_code,
                    verification.error
                );
                records.push(BrokenLinkRecord {
                    source_page: page_url.to_string(),
                    url: reference.url.clone(),
                    text: reference.text.clone(),
                    title: reference.title.clone(),
                    kind: reference.kind,
                    status_code: verification.status_code,
                    error: verification.error,
                    scope,
                    timestamp: Utc::now(),
                });
            }

            if !self.pause().await {
                break;
            }
        }

        records
    }

    /// Sleeps the pacing delay; returns false if interrupted
    async fn pause(&self) -> bool {
        if self.delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.delay) => true,
        }
    }

    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}
