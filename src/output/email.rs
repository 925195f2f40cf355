//! Email notification
//!
//! Sends the plain-text summary over SMTP with STARTTLS, with the HTML
//! report attached when one is configured. Sending blocks the calling
//! thread.

use crate::config::EmailConfig;
use crate::output::html::HtmlReport;
use crate::output::text::format_text_summary;
use crate::output::traits::{BrokenLinkRecord, OutputError, OutputResult, ReportSink, RunSummary};
use crate::url::extract_authority;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::Path;
use url::Url;

/// Report sink mailing the run summary to the configured recipients
#[derive(Debug, Clone)]
pub struct EmailReport {
    config: EmailConfig,
    attachment: Option<HtmlReport>,
}

impl EmailReport {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            attachment: None,
        }
    }

    /// Attaches the report `html` writes for the same run
    ///
    /// The file is written on demand if that sink has not run yet.
    pub fn with_attachment(mut self, html: HtmlReport) -> Self {
        self.attachment = Some(html);
        self
    }

    /// The subject line with `{domain}` filled in from the start URL
    pub fn subject(&self, summary: &RunSummary) -> String {
        let domain = Url::parse(&summary.start_url)
            .ok()
            .and_then(|url| extract_authority(&url))
            .unwrap_or_else(|| summary.start_url.clone());
        self.config.subject.replace("{domain}", &domain)
    }

    /// Builds the message without sending it
    ///
    /// # Arguments
    ///
    /// * `summary` - The run summary
    /// * `findings` - Broken links listed in the body
    /// * `report` - HTML report file to attach, if any
    pub fn build_message(
        &self,
        summary: &RunSummary,
        findings: &[BrokenLinkRecord],
        report: Option<&Path>,
    ) -> OutputResult<Message> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.from_email)?)
            .subject(self.subject(summary));
        for recipient in &self.config.to_emails {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        let body = SinglePart::plain(format_email_body(summary, findings, report.is_some()));

        let message = match report {
            Some(path) => {
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "broken_links_report.html".to_string());
                let content = std::fs::read(path)?;
                let attachment = Attachment::new(filename).body(content, ContentType::TEXT_HTML);
                builder.multipart(MultiPart::mixed().singlepart(body).singlepart(attachment))
            }
            None => builder.singlepart(body),
        };

        message.map_err(|e| OutputError::Email(format!("Failed to build message: {}", e)))
    }

    fn send(&self, message: &Message) -> OutputResult<()> {
        let transport = SmtpTransport::starttls_relay(&self.config.smtp_server)
            .map_err(|e| OutputError::Email(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.from_email.clone(),
                self.config.from_password.clone(),
            ))
            .build();

        transport
            .send(message)
            .map_err(|e| OutputError::Email(e.to_string()))?;
        Ok(())
    }
}

impl ReportSink for EmailReport {
    fn emit(&self, summary: &RunSummary, findings: &[BrokenLinkRecord]) -> OutputResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let report = match &self.attachment {
            Some(html) => {
                let path = html.report_path(summary);
                if path.exists() {
                    Some(path)
                } else {
                    Some(html.write(summary, findings)?)
                }
            }
            None => None,
        };

        let message = self.build_message(summary, findings, report.as_deref())?;
        self.send(&message)?;

        tracing::info!(
            "Email report sent to {}",
            self.config.to_emails.join(", ")
        );
        Ok(())
    }
}

/// Formats the plain-text email body
pub fn format_email_body(
    summary: &RunSummary,
    findings: &[BrokenLinkRecord],
    has_attachment: bool,
) -> String {
    let mut body = if summary.is_clean() {
        format!("No broken links found on {}\n\n", summary.start_url)
    } else {
        format!("Broken Links Report for {}\n\n", summary.start_url)
    };

    body.push_str(&format_text_summary(summary, findings));

    if has_attachment {
        body.push_str("\nPlease see the attached HTML report for a detailed, formatted view.\n");
    }
    body.push_str("\nThis is an automated report from your website link checker.\n");
    body
}

fn parse_mailbox(address: &str) -> OutputResult<Mailbox> {
    address
        .parse()
        .map_err(|e| OutputError::Email(format!("Invalid address '{}': {}", address, e)))
}
