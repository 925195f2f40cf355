//! Link-Sentry main entry point
//!
//! This is the command-line interface for the Link-Sentry broken link checker.

use anyhow::Context;
use clap::Parser;
use link_sentry::config::{load_config_with_hash, validate, write_default_config, Config};
use link_sentry::crawler::Coordinator;
use link_sentry::output::{emit_all, EmailReport, HtmlReport, ReportSink, TextReport};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Link-Sentry: a broken link checker
///
/// Link-Sentry crawls every page of one website, verifies each hyperlink,
/// stylesheet and image it references, and reports the broken ones with
/// the page they were found on.
#[derive(Parser, Debug)]
#[command(name = "link-sentry")]
#[command(version = "1.0.0")]
#[command(about = "A broken link checker for a single website", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long)]
    dry_run: bool,

    /// Crawl from this URL instead of the configured one
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Skip writing the HTML report file
    #[arg(long)]
    no_report: bool,

    /// Skip the email notification even if it is enabled in the config
    #[arg(long)]
    no_email: bool,

    /// Also append logs to a file (link_checker.log if no path is given)
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "link_checker.log"
    )]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    if !cli.config.exists() {
        write_default_config(&cli.config).with_context(|| {
            format!("Failed to write default configuration to {}", cli.config.display())
        })?;
        println!(
            "No configuration found; wrote defaults to {}. Edit it and run again.",
            cli.config.display()
        );
        return Ok(());
    }

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(start_url) = cli.start_url {
        config.start_url = start_url;
        validate(&config).context("Invalid --start-url")?;
    }

    if cli.dry_run {
        print_dry_run(&config, &config_hash);
        return Ok(());
    }

    handle_crawl(config, config_hash, cli.no_report, cli.no_email).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With `log_file` set, the same events are appended to that file without
/// ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_sentry=info,warn"),
            1 => EnvFilter::new("link_sentry=debug,info"),
            2 => EnvFilter::new("link_sentry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the settings a run would use
fn print_dry_run(config: &Config, config_hash: &str) {
    println!("=== Link-Sentry Dry Run ===\n");

    println!("Start URL: {}", config.start_url);
    println!("Config hash: {}", config_hash);

    println!("\nCrawler Configuration:");
    println!("  Max workers: {}", config.crawler.max_workers);
    println!(
        "  Delay between requests: {}s",
        config.crawler.delay_between_requests
    );
    println!("  Timeout: {}s", config.crawler.timeout);
    println!(
        "  Retries: {} (backoff {}s)",
        config.crawler.max_retries, config.crawler.retry_backoff
    );
    println!("  User agent: {}", config.crawler.user_agent);
    println!(
        "  External links: {}",
        if config.include_external_links {
            "checked"
        } else {
            "skipped"
        }
    );

    println!("\nExclude Patterns ({}):", config.exclude_patterns.len());
    for pattern in &config.exclude_patterns {
        println!("  - {}", pattern);
    }

    println!(
        "\nExclude-Check Patterns ({}):",
        config.exclude_check_patterns.len()
    );
    for pattern in &config.exclude_check_patterns {
        println!("  - {}", pattern);
    }

    println!("\nOutput:");
    println!("  Report dir: {}", config.output.report_dir.display());
    println!("  HTML report: {}", config.output.write_html);

    println!("\nEmail:");
    if config.email.enabled {
        println!(
            "  Via {}:{} from {}",
            config.email.smtp_server, config.email.smtp_port, config.email.from_email
        );
        println!("  To: {}", config.email.to_emails.join(", "));
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    no_report: bool,
    no_email: bool,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // First Ctrl-C drains the run; the report still gets written
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing up...");
            interrupt.cancel();
        }
    });

    let html_report = if config.output.write_html && !no_report {
        Some(HtmlReport::new(config.output.report_dir.clone()))
    } else {
        None
    };

    let email_report = if config.email.enabled && !no_email {
        let mut sink = EmailReport::new(config.email.clone());
        if let Some(html) = &html_report {
            sink = sink.with_attachment(html.clone());
        }
        Some(sink)
    } else {
        None
    };

    let coordinator = Coordinator::new(config, cancel)
        .context("Failed to start crawl")?
        .with_config_hash(config_hash);

    let outcome = coordinator.run().await.context("Crawl failed")?;

    let text_report = TextReport;
    let mut sinks: Vec<&dyn ReportSink> = vec![&text_report];
    if let Some(html) = &html_report {
        sinks.push(html);
    }
    if let Some(email) = &email_report {
        sinks.push(email);
    }

    // The SMTP transport blocks
    tokio::task::block_in_place(|| emit_all(&sinks, &outcome.summary, &outcome.findings))
        .context("Failed to write report")?;

    Ok(())
}
