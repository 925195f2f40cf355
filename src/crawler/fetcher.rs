//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client
//! - The transport-level retry policy (429/5xx and transient failures)
//! - Fetching pages and deciding whether they are HTML
//! - Describing transport failures for reports

use crate::config::CrawlerConfig;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Statuses worth retrying; everything else is final on first sight
const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchResult {
    /// 2xx response with an HTML body
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// 2xx response that is not HTML; nothing to extract
    ContentMismatch {
        status_code: u16,
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-2xx response after redirects and retries
    HttpError {
        status_code: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },

    /// The request never produced a response (DNS, refused, timeout)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// HTTP status code, 0 for network errors
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { status_code, .. }
            | Self::ContentMismatch { status_code, .. }
            | Self::HttpError { status_code, .. } => *status_code,
            Self::NetworkError { .. } => 0,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::HttpError { reason, .. } => Some(reason),
            Self::NetworkError { error } => Some(error),
            _ => None,
        }
    }

    /// True for transport failures and statuses >= 400
    pub fn is_broken(&self) -> bool {
        match self {
            Self::NetworkError { .. } => true,
            other => other.status_code() >= 400,
        }
    }
}

/// Bounded retry with exponential backoff
///
/// Retry `n` (1-based) sleeps `backoff * 2^(n-1)` first. With the default
/// one-second backoff and three retries that is 1s, 2s, 4s.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.max_retries, config.retry_backoff())
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    pub fn is_retryable_error(&self, error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    /// Sleep before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use link_sentry::config::CrawlerConfig;
/// use link_sentry::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(20)
        .gzip(true)
        .brotli(true)
        .build()
}

/// The shared HTTP client plus its retry policy
///
/// Cheap to clone; clones share one connection pool and one cancellation
/// token.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops retry backoff early once `cancel` fires
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builds the client and retry policy from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            RetryPolicy::from_config(config),
        ))
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Sends a GET, retrying per the policy
    ///
    /// After the retry budget is spent the last response (or error) is
    /// returned as-is, so callers still see the real status. The same holds
    /// when the cancellation token fires: no further attempt is made and a
    /// pending backoff sleep is cut short.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut retry = 0;

        loop {
            let result = self.client.get(url).send().await;

            let retryable = match &result {
                Ok(response) => self.retry.is_retryable_status(response.status()),
                Err(e) => self.retry.is_retryable_error(e),
            };

            if !retryable || retry >= self.retry.max_retries || self.cancel.is_cancelled() {
                return result;
            }

            retry += 1;
            let delay = self.retry.delay_for(retry);
            tracing::debug!(
                "Retrying {} in {:?} (attempt {}/{})",
                url,
                delay,
                retry,
                self.retry.max_retries
            );

            let cancelled = tokio::select! {
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                tracing::debug!("Retry of {} abandoned on interrupt", url);
                return result;
            }
        }
    }

    /// Fetches a page, returning its body only if it is HTML
    ///
    /// # Request Flow
    ///
    /// 1. GET with redirects followed and retries applied
    /// 2. Non-2xx → `HttpError`
    /// 3. Content-Type without `text/html` → `ContentMismatch`
    /// 4. Otherwise read the body → `Success`
    ///
    /// Transport failures (including timeouts and body read errors) become
    /// `NetworkError`; this function never fails.
    pub async fn fetch_page(&self, url: &str) -> FetchResult {
        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => {
                return FetchResult::NetworkError {
                    error: describe_transport_error(&e),
                }
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
                reason: reason_phrase(status),
            };
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.contains("text/html") {
            return FetchResult::ContentMismatch {
                status_code: status.as_u16(),
                content_type,
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body,
            },
            Err(e) => FetchResult::NetworkError {
                error: describe_transport_error(&e),
            },
        }
    }
}

/// Reason phrase for a status, falling back to the bare code
pub fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Describes a transport failure in one line
///
/// The result is never empty; it names the failure class and the
/// underlying cause when one is available.
pub fn describe_transport_error(error: &reqwest::Error) -> String {
    let class = if error.is_timeout() {
        "Request timeout"
    } else if error.is_connect() {
        "Connection failed"
    } else if error.is_redirect() {
        "Redirect error"
    } else if error.is_body() || error.is_decode() {
        "Failed to read response body"
    } else {
        "Request failed"
    };

    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail = format!("{}: {}", detail, cause);
        source = cause.source();
    }

    format!("{} ({})", class, detail)
}
