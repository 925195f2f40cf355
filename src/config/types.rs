use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Browser-like user agent; some sites reject unknown clients outright
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Link-Sentry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Page the crawl starts from; its host defines "internal"
    pub start_url: String,

    /// Regexes excluding URLs from both crawling and checking
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regexes excluding URLs from checking only
    #[serde(default)]
    pub exclude_check_patterns: Vec<String>,

    /// Whether links to other hosts are verified at all
    #[serde(default = "default_true")]
    pub include_external_links: bool,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Size of the verification worker pool
    pub max_workers: usize,

    /// Pause after each consumed verification and after each page (seconds)
    pub delay_between_requests: f64,

    /// Per-request timeout for fetches and verifications (seconds)
    pub timeout: f64,

    /// Extra attempts on 429/5xx and transient transport failures
    pub max_retries: u32,

    /// Base of the exponential retry backoff (seconds)
    pub retry_backoff: f64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory the HTML report is written into
    pub report_dir: PathBuf,

    /// Whether an HTML report file is written at all
    pub write_html: bool,
}

/// Email notification settings
///
/// Mail is sent over SMTP with STARTTLS, authenticating as `from-email`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EmailConfig {
    pub enabled: bool,

    pub smtp_server: String,

    pub smtp_port: u16,

    /// Sender address, also the SMTP login
    pub from_email: String,

    pub from_password: String,

    pub to_emails: Vec<String>,

    /// Subject line; `{domain}` is replaced by the start URL's host
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            from_email: String::new(),
            from_password: String::new(),
            to_emails: Vec::new(),
            subject: "Broken Links Report for {domain}".to_string(),
        }
    }
}

// Hand-written so the password never reaches a log line
impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("from_email", &self.from_email)
            .field("from_password", &"<redacted>")
            .field("to_emails", &self.to_emails)
            .field("subject", &self.subject)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: 3,
            delay_between_requests: 1.0,
            timeout: 30.0,
            max_retries: 3,
            retry_backoff: 1.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("."),
            write_html: true,
        }
    }
}

impl CrawlerConfig {
    /// The inter-request pacing delay as a `Duration`
    pub fn delay(&self) -> Duration {
        seconds(self.delay_between_requests)
    }

    pub fn timeout(&self) -> Duration {
        seconds(self.timeout)
    }

    pub fn retry_backoff(&self) -> Duration {
        seconds(self.retry_backoff)
    }
}

/// Converts seconds to a `Duration`, saturating instead of panicking
///
/// Negative and NaN values become zero; values too large for a `Duration`
/// become `Duration::MAX`. Validation rejects both long before this matters.
fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

impl Config {
    /// Builds a configuration with default settings for the given start URL
    ///
    /// The result is not validated; pass it through
    /// [`validate`](crate::config::validate) before crawling.
    pub fn from_start_url(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            exclude_patterns: Vec::new(),
            exclude_check_patterns: Vec::new(),
            include_external_links: true,
            crawler: CrawlerConfig::default(),
            output: OutputConfig::default(),
            email: EmailConfig::default(),
        }
    }
}
