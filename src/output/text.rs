//! Plain-text run summary
//!
//! The same text is printed to the console at the end of a run and is meant
//! to double as the body of a notification message.

use crate::output::traits::{BrokenLinkRecord, OutputResult, ReportSink, RunSummary};

const RULE_WIDTH: usize = 80;

/// Report sink printing the plain-text summary to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReport;

impl ReportSink for TextReport {
    fn emit(&self, summary: &RunSummary, findings: &[BrokenLinkRecord]) -> OutputResult<()> {
        print!("{}", format_text_summary(summary, findings));
        Ok(())
    }
}

/// Formats a run as plain text
pub fn format_text_summary(summary: &RunSummary, findings: &[BrokenLinkRecord]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    if summary.interrupted {
        out.push_str("Crawl interrupted; results are partial.\n");
    } else {
        out.push_str("Crawling complete!\n");
    }
    out.push_str(&format!("Website: {}\n", summary.start_url));
    out.push_str(&format!(
        "Scan completed at: {}\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Duration: {}s\n",
        summary.duration().num_seconds()
    ));
    out.push_str("Final statistics:\n");
    out.push_str(&format!("  - Pages crawled: {}\n", summary.pages_visited));
    out.push_str(&format!("  - Broken links found: {}\n", summary.broken_links));
    out.push_str(&format!(
        "  - External links checked: {}\n",
        summary.external_links_checked
    ));

    if findings.is_empty() {
        out.push_str("\nNo broken links found!\n");
    } else {
        out.push_str("\nBroken links summary:\n");
        for (i, record) in findings.iter().enumerate() {
            out.push_str(&format!(
                "  {}. \"{}\" -> {} [{}]\n",
                i + 1,
                record.text,
                record.url,
                record.status_code
            ));
            if !record.error.is_empty() {
                out.push_str(&format!("     Error: {}\n", record.error));
            }
            out.push_str(&format!(
                "     Found on: {} ({}, {})\n",
                record.source_page, record.kind, record.scope
            ));
        }
    }

    out.push_str(&format!("{}\n", rule));
    out
}
