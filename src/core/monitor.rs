use crate::config::email::EmailConfig;
use crate::config::toml_config::WatchConfig;
use crate::core::decision::DecisionEngine;
use crate::core::notifier::Notifier;
use crate::core::report::{render_report, Report};
use crate::domain::model::{DecisionBatch, DomainRecord};
use crate::domain::ports::{DomainReader, MailTransport};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;
use tracing::{info_span, Instrument, Span};

/// What one monitoring run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub timestamp: DateTime<Local>,
    pub requested: usize,
    pub processed: usize,
    pub failed_lookups: usize,
    pub decision: Option<DecisionBatch>,
    pub log_written: bool,
    pub email_sent: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl RunSummary {
    fn new(requested: usize) -> Self {
        Self {
            timestamp: Local::now(),
            requested,
            processed: 0,
            failed_lookups: 0,
            decision: None,
            log_written: false,
            email_sent: false,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };

        writeln!(f, "{}", rule)?;
        writeln!(f, "DOMAIN MONITORING SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Run at: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Domains processed: {}", self.processed)?;
        writeln!(f, "Domains with errors: {}", self.failed_lookups)?;

        if let Some(decision) = &self.decision {
            let thresholds = decision.thresholds();
            writeln!(
                f,
                "Critical domains (<={} days): {}",
                thresholds.critical_days,
                decision.critical_count()
            )?;
            writeln!(
                f,
                "Warning domains ({}-{} days): {}",
                thresholds.critical_days + 1,
                thresholds.warning_days,
                decision.warning_count()
            )?;
            writeln!(f, "Log written: {}", yes_no(self.log_written))?;
            writeln!(f, "Email sent: {}", yes_no(self.email_sent))?;
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "WARNINGS:")?;
            for warning in &self.warnings {
                writeln!(f, "- {}", warning)?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "ERRORS:")?;
            for error in &self.errors {
                writeln!(f, "- {}", error)?;
            }
        }

        write!(f, "{}", rule)
    }
}

/// Where a run's side effects go.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub log_path: PathBuf,
    pub recipients: Vec<String>,
    pub email: Option<EmailConfig>,
    pub force_notify: bool,
}

impl From<&WatchConfig> for DispatchSettings {
    fn from(config: &WatchConfig) -> Self {
        Self {
            log_path: PathBuf::from(config.log_path()),
            recipients: config.monitor.recipients.clone(),
            email: config.email.clone(),
            force_notify: config.monitor.force_notify,
        }
    }
}

/// Runs reader → decision engine → notifier once per call.
pub struct DomainMonitor<R: DomainReader, T: MailTransport> {
    reader: R,
    engine: DecisionEngine,
    notifier: Notifier<T>,
    settings: DispatchSettings,
    span: Span,
}

impl<R: DomainReader, T: MailTransport> DomainMonitor<R, T> {
    pub fn new(reader: R, transport: T, settings: DispatchSettings) -> Self {
        Self {
            reader,
            engine: DecisionEngine::new(info_span!("decision_engine")),
            notifier: Notifier::new(transport, info_span!("notifier")),
            settings,
            span: info_span!("domain_monitor"),
        }
    }

    pub fn with_engine(mut self, engine: DecisionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Reads and classifies without touching the log or the mail server.
    pub async fn preview(&self, domains: &[String]) -> Option<(DecisionBatch, Report)> {
        let records = self.read(domains).await;
        if records.is_empty() {
            return None;
        }
        let batch = self.engine.evaluate(&records, self.settings.force_notify);
        let report = render_report(&batch);
        Some((batch, report))
    }

    pub async fn run(&self, domains: &[String]) -> RunSummary {
        self.run_inner(domains).instrument(self.span.clone()).await
    }

    async fn read(&self, domains: &[String]) -> Vec<DomainRecord> {
        tracing::info!("Step 1: reading {} domains", domains.len());
        self.reader.read(domains).await
    }

    async fn run_inner(&self, domains: &[String]) -> RunSummary {
        let mut summary = RunSummary::new(domains.len());
        tracing::info!("🚀 Starting monitoring run for {} domains", domains.len());

        let records = self.read(domains).await;
        summary.processed = records.len();
        summary.failed_lookups = domains.len().saturating_sub(records.len());

        if records.is_empty() {
            tracing::warn!("No domain information could be retrieved");
            summary
                .warnings
                .push("No domain information could be retrieved".to_string());
            return summary;
        }

        tracing::info!("Step 2: evaluating {} records", records.len());
        let batch = self.engine.evaluate(&records, self.settings.force_notify);

        tracing::info!("Step 3: dispatching notifications");
        let settings = &self.settings;

        let log_step = async {
            if batch.should_log() {
                Some(self.notifier.append_log(&batch, &settings.log_path))
            } else {
                None
            }
        };

        let email_step = async {
            if !batch.should_notify() {
                return None;
            }
            if settings.recipients.is_empty() {
                tracing::warn!("Notification is due but no recipients are configured");
                return None;
            }
            Some(
                self.notifier
                    .send_email(&batch, &settings.recipients, settings.email.as_ref())
                    .await,
            )
        };

        // 兩個副作用互相獨立，任何一個失敗都不影響另一個
        let (log_result, email_result) = tokio::join!(log_step, email_step);

        if let Some(written) = log_result {
            summary.log_written = written;
            if !written {
                summary.errors.push(format!(
                    "Failed to write alert log to {}",
                    settings.log_path.display()
                ));
            }
        }

        match email_result {
            Some(true) => summary.email_sent = true,
            Some(false) => summary.errors.push("Failed to send alert email".to_string()),
            None if batch.should_notify() => summary
                .warnings
                .push("Notification was due but no recipients are configured".to_string()),
            None => {}
        }

        tracing::info!(
            critical = batch.critical_count(),
            warning = batch.warning_count(),
            log_written = summary.log_written,
            email_sent = summary.email_sent,
            "✅ Monitoring run complete"
        );

        summary.decision = Some(batch);
        summary
    }
}
