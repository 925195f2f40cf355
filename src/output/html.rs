//! HTML report generation
//!
//! Writes a standalone HTML page with a summary block and one table row per
//! broken link. Every value taken from the crawled site is escaped.

use crate::output::traits::{BrokenLinkRecord, OutputResult, ReportSink, RunSummary};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; }
        .summary { background-color: #f0f0f0; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }
        .external { background-color: #fff3cd; }
        .internal { background-color: #f8d7da; }
        .error { color: #721c24; }
        .link-text { font-weight: bold; color: #0066cc; }
        .success { color: #28a745; font-size: 1.2em; }
"#;

/// Report sink writing `broken_links_report_<timestamp>.html` into a directory
#[derive(Debug, Clone)]
pub struct HtmlReport {
    dir: PathBuf,
}

impl HtmlReport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file name a report for `summary` is written to
    pub fn report_path(&self, summary: &RunSummary) -> PathBuf {
        let stamp = summary.finished_at.format("%Y-%m-%d_%H-%M-%S");
        self.dir.join(format!("broken_links_report_{}.html", stamp))
    }

    /// Writes the report and returns its path
    pub fn write(&self, summary: &RunSummary, findings: &[BrokenLinkRecord]) -> OutputResult<PathBuf> {
        let path = self.report_path(summary);
        generate_html_report(summary, findings, &path)?;
        Ok(path)
    }
}

impl ReportSink for HtmlReport {
    fn emit(&self, summary: &RunSummary, findings: &[BrokenLinkRecord]) -> OutputResult<()> {
        let path = self.write(summary, findings)?;
        tracing::info!("Report saved: {}", path.display());
        Ok(())
    }
}

/// Generates an HTML report file
///
/// # Arguments
///
/// * `summary` - The run summary
/// * `findings` - Broken links to list
/// * `output_path` - Path where the HTML file should be written
pub fn generate_html_report(
    summary: &RunSummary,
    findings: &[BrokenLinkRecord],
    output_path: &Path,
) -> OutputResult<()> {
    let html = format_html_report(summary, findings);

    let mut file = File::create(output_path)?;
    file.write_all(html.as_bytes())?;

    Ok(())
}

/// Formats a run as an HTML document
pub fn format_html_report(summary: &RunSummary, findings: &[BrokenLinkRecord]) -> String {
    let mut html = String::new();
    let site = encode_text(&summary.start_url);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str(&format!("    <title>Broken Links Report - {}</title>\n", site));
    html.push_str(&format!("    <style>{}    </style>\n", STYLE));
    html.push_str("</head>\n<body>\n");
    html.push_str("    <h1>Broken Links Report</h1>\n");

    // Summary block
    html.push_str("    <div class=\"summary\">\n");
    html.push_str("        <h2>Summary</h2>\n");
    html.push_str(&format!("        <p><strong>Website:</strong> {}</p>\n", site));
    html.push_str(&format!(
        "        <p><strong>Scan Date:</strong> {}</p>\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!(
        "        <p><strong>Pages Crawled:</strong> {}</p>\n",
        summary.pages_visited
    ));
    html.push_str(&format!(
        "        <p><strong>Broken Links Found:</strong> {}</p>\n",
        summary.broken_links
    ));
    html.push_str(&format!(
        "        <p><strong>Internal Broken Links:</strong> {}</p>\n",
        summary.internal_broken
    ));
    html.push_str(&format!(
        "        <p><strong>External Broken Links:</strong> {}</p>\n",
        summary.external_broken
    ));
    html.push_str(&format!(
        "        <p><strong>External Links Checked:</strong> {}</p>\n",
        summary.external_links_checked
    ));
    if let Some(hash) = &summary.config_hash {
        html.push_str(&format!(
            "        <p><strong>Config Hash:</strong> {}</p>\n",
            encode_text(hash)
        ));
    }
    if summary.interrupted {
        html.push_str("        <p><strong>Note:</strong> the scan was interrupted; results are partial.</p>\n");
    }
    html.push_str("    </div>\n");

    if findings.is_empty() {
        html.push_str("    <h2 class=\"success\">No broken links found!</h2>\n");
    } else {
        html.push_str("    <h2>Broken Links Details</h2>\n");
        html.push_str("    <table>\n");
        html.push_str("        <tr><th>Source Page</th><th>Link Text</th><th>Broken Link</th><th>Status Code</th><th>Error</th><th>Type</th></tr>\n");

        for record in findings {
            html.push_str(&format_row(record));
        }

        html.push_str("    </table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn format_row(record: &BrokenLinkRecord) -> String {
    let scope = record.scope.as_str();
    let mut label = scope.to_string();
    label[..1].make_ascii_uppercase();

    format!(
        "        <tr class=\"{scope}\"><td><a href=\"{href}\" target=\"_blank\">{source}</a></td>\
<td><span class=\"link-text\">\"{text}\"</span><br><small>{title}</small></td>\
<td class=\"error\">{url}</td><td>{status}</td><td>{error}</td><td>{label}</td></tr>\n",
        scope = scope,
        href = encode_double_quoted_attribute(&record.source_page),
        source = encode_text(&record.source_page),
        text = encode_text(&record.text),
        title = encode_text(&record.title),
        url = encode_text(&record.url),
        status = record.status_code,
        error = encode_text(&record.error),
        label = label,
    )
}
