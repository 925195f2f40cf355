//! Output module for reporting crawl results
//!
//! This module handles:
//! - The finding and summary types produced by a run
//! - Rendering an HTML report file
//! - Rendering a plain-text console summary
//! - Mailing the summary with the HTML report attached

mod email;
mod html;
mod text;
mod traits;

pub use email::{format_email_body, EmailReport};
pub use html::{format_html_report, generate_html_report, HtmlReport};
pub use text::{format_text_summary, TextReport};
pub use traits::{BrokenLinkRecord, OutputError, OutputResult, ReportSink, RunSummary};

/// Hands a finished run to every sink in order
///
/// All sinks are attempted; the first error is returned after the rest ran,
/// so a failing file write never suppresses the console summary.
pub fn emit_all(
    sinks: &[&dyn ReportSink],
    summary: &RunSummary,
    findings: &[BrokenLinkRecord],
) -> OutputResult<()> {
    let mut first_error = None;

    for sink in sinks {
        if let Err(e) = sink.emit(summary, findings) {
            tracing::error!("Failed to emit report: {}", e);
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
