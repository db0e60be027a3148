use crate::config::email::EmailConfig;
use crate::core::report::{render_report, TIMESTAMP_FORMAT};
use crate::domain::model::{DecisionBatch, EmailMessage};
use crate::domain::ports::MailTransport;
use crate::utils::error::Result;
use chrono::{Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{Instrument, Span};

pub const LOG_SEPARATOR_WIDTH: usize = 60;

/// Renders the block `append_log` writes for one run.
pub fn render_log_block(batch: &DecisionBatch, at: NaiveDateTime) -> String {
    let separator = "=".repeat(LOG_SEPARATOR_WIDTH);
    let mut lines = vec![
        String::new(),
        separator.clone(),
        format!("ALERT LOG - {}", at.format(TIMESTAMP_FORMAT)),
        separator.clone(),
    ];

    if !batch.critical().is_empty() {
        lines.push(String::new());
        lines.push("CRITICAL DOMAINS:".to_string());
        for record in batch.critical() {
            lines.push(domain_line(record.domain(), record.days_until_expiration()));
        }
    }

    if !batch.warning().is_empty() {
        lines.push(String::new());
        lines.push("WARNING DOMAINS:".to_string());
        for record in batch.warning() {
            lines.push(domain_line(record.domain(), record.days_until_expiration()));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Summary: {} critical, {} warning",
        batch.critical_count(),
        batch.warning_count()
    ));
    lines.push(separator);

    let mut block = lines.join("\n");
    block.push('\n');
    block
}

fn domain_line(domain: &str, days: Option<i64>) -> String {
    match days {
        Some(d) => format!("- {}: {} days", domain, d),
        None => format!("- {}: unknown", domain),
    }
}

pub fn append_log(batch: &DecisionBatch, destination: impl AsRef<Path>) -> bool {
    append_log_at(batch, destination, Local::now().naive_local())
}

/// Appends the run's alert block; a no-op returning `true` when nothing is
/// critical. Write failures are logged and reported as `false`.
pub fn append_log_at(batch: &DecisionBatch, destination: impl AsRef<Path>, at: NaiveDateTime) -> bool {
    let destination = destination.as_ref();

    if !batch.should_log() {
        tracing::info!("No critical domains, alert log not required");
        return true;
    }

    match write_block(destination, &render_log_block(batch, at)) {
        Ok(()) => {
            tracing::info!(path = %destination.display(), "📝 Alert log written");
            true
        }
        Err(e) => {
            tracing::error!(path = %destination.display(), "❌ Failed to write alert log: {}", e);
            false
        }
    }
}

// 單次 write_all 寫入整個區塊，不截斷既有內容
fn write_block(destination: &Path, block: &str) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)?;
    file.write_all(block.as_bytes())?;
    file.flush()?;
    Ok(())
}

pub fn email_subject(batch: &DecisionBatch) -> String {
    if batch.critical_count() > 0 {
        format!(
            "ALERT: {} domains critically close to expiry",
            batch.critical_count()
        )
    } else {
        format!(
            "Domain monitoring report - {} domains reviewed",
            batch.total_evaluated()
        )
    }
}

pub fn compose_email(
    batch: &DecisionBatch,
    recipients: &[String],
    config: &EmailConfig,
    body: String,
) -> EmailMessage {
    EmailMessage {
        from: config.sender.clone(),
        to: recipients.to_vec(),
        subject: email_subject(batch),
        body,
    }
}

/// Sends the rendered report as one message to every recipient.
///
/// Returns `false` without touching the transport when email is not
/// configured or nobody would receive it. Transport failures are logged and
/// turned into `false`; nothing here retries or imposes a timeout.
pub async fn send_email<T: MailTransport + ?Sized>(
    transport: &T,
    batch: &DecisionBatch,
    recipients: &[String],
    config: Option<&EmailConfig>,
) -> bool {
    let Some(config) = config else {
        tracing::error!("❌ No email configuration, alert email not sent");
        return false;
    };

    if recipients.is_empty() {
        tracing::error!("❌ No recipients, alert email not sent");
        return false;
    }

    let message = compose_email(batch, recipients, config, render_report(batch).into_string());

    tracing::info!(
        server = %config.server,
        port = config.port,
        "📧 Sending alert email to {} recipients",
        recipients.len()
    );

    match transport.deliver(config, &message).await {
        Ok(()) => {
            tracing::info!("✅ Alert email sent to {} recipients", recipients.len());
            true
        }
        Err(e) => {
            tracing::error!(
                category = ?e.category(),
                "❌ Failed to send alert email: {}",
                e
            );
            false
        }
    }
}

/// The two dispatch operations, bound to a transport and a diagnostic span.
pub struct Notifier<T: MailTransport> {
    transport: T,
    span: Span,
}

impl<T: MailTransport> Notifier<T> {
    pub fn new(transport: T, span: Span) -> Self {
        Self { transport, span }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn append_log(&self, batch: &DecisionBatch, destination: impl AsRef<Path>) -> bool {
        self.span.in_scope(|| append_log(batch, destination))
    }

    pub async fn send_email(
        &self,
        batch: &DecisionBatch,
        recipients: &[String],
        config: Option<&EmailConfig>,
    ) -> bool {
        send_email(&self.transport, batch, recipients, config)
            .instrument(self.span.clone())
            .await
    }
}
