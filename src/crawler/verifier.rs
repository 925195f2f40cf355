//! Link verification
//!
//! A single GET per link decides its health. Redirects are followed and the
//! fetcher's retry policy applies; nothing is retried on top of that here.

use crate::crawler::fetcher::{describe_transport_error, reason_phrase, Fetcher};

/// Outcome of probing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Status < 400
    pub healthy: bool,

    /// HTTP status code, 0 when no response was received
    pub status_code: u16,

    /// Reason phrase or transport error; empty when healthy
    ///
    /// For HTTP failures this is the canonical reason phrase of the status
    /// code (`Not Found` for 404), not the phrase the server sent.
    pub error: String,
}

impl Verification {
    pub fn healthy(status_code: u16) -> Self {
        Self {
            healthy: true,
            status_code,
            error: String::new(),
        }
    }

    pub fn broken(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            status_code,
            error: error.into(),
        }
    }

    /// A failure below HTTP; always status 0
    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self::broken(0, error)
    }

    pub fn is_transport_failure(&self) -> bool {
        !self.healthy && self.status_code == 0
    }
}

/// Verifies a single URL
///
/// # Returns
///
/// - status < 400 → healthy
/// - status >= 400 → broken with the status and its reason phrase
/// - no response (DNS, refused, timeout) → broken with status 0
pub async fn verify_link(fetcher: &Fetcher, url: &str) -> Verification {
    match fetcher.get(url).await {
        Ok(response) => {
            let status = response.status();
            if status.as_u16() < 400 {
                Verification::healthy(status.as_u16())
            } else {
                Verification::broken(status.as_u16(), reason_phrase(status))
            }
        }
        Err(e) => Verification::transport_failure(describe_transport_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{build_http_client, RetryPolicy};
    use crate::config::CrawlerConfig;

    #[test]
    fn test_constructors() {
        let ok = Verification::healthy(200);
        assert!(ok.healthy);
        assert!(ok.error.is_empty());

        let missing = Verification::broken(404, "Not Found");
        assert!(!missing.healthy);
        assert!(!missing.is_transport_failure());

        let down = Verification::transport_failure("Connection failed");
        assert_eq!(down.status_code, 0);
        assert!(down.is_transport_failure());
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_failure() {
        // Bind then drop a listener so the port is closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = CrawlerConfig::default();
        config.timeout = 2.0;
        let fetcher = Fetcher::new(build_http_client(&config).unwrap(), RetryPolicy::none());

        let result = verify_link(&fetcher, &format!("http://127.0.0.1:{}/", port)).await;

        assert!(result.is_transport_failure());
        assert!(!result.error.is_empty());
    }

    #[tokio::test]
    async fn test_error_is_canonical_reason_phrase() {
        use wiremock::matchers::path;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/odd"))
            .respond_with(ResponseTemplate::new(599))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(
            build_http_client(&CrawlerConfig::default()).unwrap(),
            RetryPolicy::none(),
        );

        let gone = verify_link(&fetcher, &format!("{}/gone", server.uri())).await;
        assert_eq!(gone.status_code, 404);
        assert_eq!(gone.error, "Not Found");

        let odd = verify_link(&fetcher, &format!("{}/odd", server.uri())).await;
        assert_eq!(odd.status_code, 599);
        assert_eq!(odd.error, "HTTP 599");
    }
}
