//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end. A second mock server stands in for
//! external sites; it differs from the first only by port.

use link_sentry::config::Config;
use link_sentry::crawler::{crawl, Coordinator, LinkKind};
use link_sentry::output::{HtmlReport, ReportSink};
use link_sentry::url::LinkScope;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration: no pacing, no retries
fn create_test_config(start_url: &str) -> Config {
    let mut config = Config::from_start_url(start_url);
    config.crawler.max_workers = 3;
    config.crawler.delay_between_requests = 0.0;
    config.crawler.timeout = 5.0;
    config.crawler.max_retries = 0;
    config.crawler.retry_backoff = 0.0;
    config.output.write_html = false;
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cyclic_site_visits_each_page_once() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/">Home</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/a#top">Back to A</a>"#).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.summary.pages_visited, 3);
    assert!(outcome.findings.is_empty());
    assert!(!outcome.summary.interrupted);
}

#[tokio::test]
async fn test_broken_internal_link_reported() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        r#"<a href="/ok" title="Fine">OK page</a><a href="/missing">Gone</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "Nothing here").await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = crawl(create_test_config(&start), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.findings.len(), 1);
    let record = &outcome.findings[0];
    assert_eq!(record.url, format!("{}/missing", server.uri()));
    assert_eq!(record.source_page, start);
    assert_eq!(record.status_code, 404);
    assert_eq!(record.error, "Not Found");
    assert_eq!(record.text, "Gone");
    assert_eq!(record.kind, LinkKind::Hyperlink);
    assert_eq!(record.scope, LinkScope::Internal);

    assert_eq!(outcome.summary.broken_links, 1);
    assert_eq!(outcome.summary.internal_broken, 1);
    assert_eq!(outcome.summary.external_broken, 0);
}

#[tokio::test]
async fn test_broken_image_and_stylesheet_reported() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<link rel="stylesheet" href="/missing.css"><img src="/missing.png" alt="Logo">"#,
    )
    .await;

    let outcome = crawl(
        create_test_config(&format!("{}/", server.uri())),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(outcome.findings.len(), 2);
    let image = outcome
        .findings
        .iter()
        .find(|r| r.kind == LinkKind::Image)
        .expect("image finding");
    assert_eq!(image.text, "[IMG: Logo]");
    assert_eq!(image.status_code, 404);

    let sheet = outcome
        .findings
        .iter()
        .find(|r| r.kind == LinkKind::Stylesheet)
        .expect("stylesheet finding");
    assert_eq!(sheet.text, "[stylesheet stylesheet]");
}

#[tokio::test]
async fn test_external_link_checked_once_per_run() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;
    let external_url = format!("{}/x", external.uri());

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{0}">X</a><a href="/a">A</a><a href="{0}">X again</a>"#, external_url),
    )
    .await;
    mount_page(&server, "/a", &format!(r#"<a href="{}">X</a>"#, external_url)).await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&external)
        .await;

    let outcome = crawl(
        create_test_config(&format!("{}/", server.uri())),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(outcome.summary.pages_visited, 2);
    assert_eq!(outcome.summary.external_links_checked, 1);
    assert!(outcome.findings.is_empty());
}

#[tokio::test]
async fn test_internal_links_checked_every_occurrence() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/a">A again</a>"#).await;

    // Two verifications from the start page plus one page fetch
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("Leaf"))
        .expect(3)
        .mount(&server)
        .await;

    let outcome = crawl(
        create_test_config(&format!("{}/", server.uri())),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(outcome.summary.pages_visited, 2);
    assert_eq!(outcome.summary.external_links_checked, 0);
}

#[tokio::test]
async fn test_external_links_skipped_when_disabled() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/x">X</a>"#, external.uri()),
    )
    .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&external)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.include_external_links = false;

    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.summary.external_links_checked, 0);
}

#[tokio::test]
async fn test_external_failures_reported_as_external() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/gone">Partner</a>"#, external.uri()),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&external)
        .await;

    let outcome = crawl(
        create_test_config(&format!("{}/", server.uri())),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].scope, LinkScope::External);
    assert_eq!(outcome.findings[0].status_code, 410);
    assert_eq!(outcome.summary.external_broken, 1);
    // External pages are verified, never crawled
    assert_eq!(outcome.summary.pages_visited, 1);
}

#[tokio::test]
async fn test_timeout_reported_as_status_zero() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/slow">Slow</a>"#, external.uri()),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&external)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.timeout = 0.5;

    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].status_code, 0);
    assert!(!outcome.findings[0].error.is_empty());
    assert!(outcome.findings[0].is_transport_failure());
}

#[tokio::test]
async fn test_retry_recovers_from_transient_errors() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/flaky">Flaky</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", "Recovered").await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.max_retries = 3;

    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert!(outcome.findings.is_empty());
}

#[tokio::test]
async fn test_retry_exhaustion_reports_final_status() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/down">Down</a>"#).await;

    // One initial attempt plus two retries for the verification, the same
    // again for the page fetch
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.max_retries = 2;

    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].status_code, 503);
    assert_eq!(outcome.findings[0].error, "Service Unavailable");
}

#[tokio::test]
async fn test_excluded_start_url_crawls_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("Private"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/private/", server.uri()));
    config.exclude_patterns = vec!["/private/".to_string()];

    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.summary.pages_visited, 0);
    assert!(outcome.findings.is_empty());
}

#[tokio::test]
async fn test_excluded_links_neither_checked_nor_crawled() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/admin/panel">Admin</a><a href="/logout">Log out</a><a href="/ok">OK</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "Fine").await;

    Mock::given(method("GET"))
        .and(path("/admin/panel"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    // Check-excluded: never verified, but still crawlable
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(html_page("Bye"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.exclude_patterns = vec!["/admin/".to_string()];
    config.exclude_check_patterns = vec!["logout".to_string()];

    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.summary.pages_visited, 3);
}

#[tokio::test]
async fn test_non_html_pages_are_not_parsed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/doc.pdf">Doc</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/hidden">not a link</a>"#, "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = crawl(
        create_test_config(&format!("{}/", server.uri())),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.summary.pages_visited, 2);
}

#[tokio::test]
async fn test_links_resolved_against_final_url_after_redirect() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/new/"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/new/", r#"<a href="child">Child</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/new/child"))
        .respond_with(html_page("Child"))
        .expect(1..)
        .mount(&server)
        .await;

    let outcome = crawl(
        create_test_config(&format!("{}/", server.uri())),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert!(outcome.findings.is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_run_with_partial_results() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "A").await;
    mount_page(&server, "/b", "B").await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.delay_between_requests = 5.0;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        interrupt.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), crawl(config, cancel))
        .await
        .expect("Crawl did not stop after cancellation")
        .expect("Crawl failed");

    assert!(outcome.summary.interrupted);
    assert_eq!(outcome.summary.pages_visited, 1);
}

#[tokio::test]
async fn test_coordinator_attaches_config_hash_and_writes_report() {
    let server = MockServer::start().await;
    let report_dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", r#"<a href="/missing">Gone <b>&amp; lost</b></a>"#).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let outcome = Coordinator::new(config, CancellationToken::new())
        .expect("Failed to create coordinator")
        .with_config_hash("abc123")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.summary.config_hash.as_deref(), Some("abc123"));

    let report = HtmlReport::new(report_dir.path());
    report
        .emit(&outcome.summary, &outcome.findings)
        .expect("Failed to write report");

    let written: Vec<_> = std::fs::read_dir(report_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(written.len(), 1);

    let html = std::fs::read_to_string(&written[0]).unwrap();
    assert!(html.contains("/missing"));
    assert!(html.contains("Gone &amp; lost"));
    assert!(html.contains("abc123"));
}

/// Mounts `count` healthy pages `/slow0..` on `server`, each answering after `delay`
async fn mount_slow_links(server: &MockServer, count: usize, delay: Duration) -> String {
    let mut links = String::new();
    for i in 0..count {
        Mock::given(method("GET"))
            .and(path(format!("/slow{}", i)))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(server)
            .await;
        links.push_str(&format!(r#"<a href="{}/slow{}">Slow {}</a>"#, server.uri(), i, i));
    }
    links
}

#[tokio::test]
async fn test_worker_count_bounds_concurrent_checks() {
    let site = MockServer::start().await;
    let external = MockServer::start().await;

    let links = mount_slow_links(&external, 6, Duration::from_millis(500)).await;
    mount_page(&site, "/", &links).await;

    let mut config = create_test_config(&format!("{}/", site.uri()));
    config.crawler.max_workers = 2;

    let started = std::time::Instant::now();
    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");
    let elapsed = started.elapsed();

    assert_eq!(outcome.summary.external_links_checked, 6);
    assert!(outcome.findings.is_empty());
    // Six half-second checks through two workers take three rounds
    assert!(
        elapsed >= Duration::from_millis(1450),
        "finished too fast for two workers: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_delay_paces_each_verification() {
    let site = MockServer::start().await;
    let external = MockServer::start().await;

    let links = mount_slow_links(&external, 4, Duration::ZERO).await;
    mount_page(&site, "/", &links).await;

    let mut config = create_test_config(&format!("{}/", site.uri()));
    config.crawler.max_workers = 4;
    config.crawler.delay_between_requests = 0.25;

    let started = std::time::Instant::now();
    let outcome = crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed");
    let elapsed = started.elapsed();

    assert_eq!(outcome.summary.external_links_checked, 4);
    assert!(outcome.findings.is_empty());
    assert!(
        elapsed >= Duration::from_millis(1000),
        "four results at 250ms pacing finished in {:?}",
        elapsed
    );
}
