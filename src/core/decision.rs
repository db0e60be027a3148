use crate::domain::model::{DecisionBatch, DomainRecord, ExpiryThresholds, Severity, StatusRow};
use tracing::Span;

/// Classifies registration records with the 30/50 day thresholds.
///
/// Total over its input and free of side effects. The clock is never read
/// here: day counts were fixed when the records were created.
pub fn classify(records: &[DomainRecord], force_notify: bool) -> DecisionBatch {
    classify_with(records, force_notify, &ExpiryThresholds::REGISTRATION)
}

pub fn classify_with(
    records: &[DomainRecord],
    force_notify: bool,
    thresholds: &ExpiryThresholds,
) -> DecisionBatch {
    // 沒有任何紀錄時不產生部分報告，也不強制通知
    if records.is_empty() {
        return DecisionBatch::empty(*thresholds);
    }

    let mut critical = Vec::new();
    let mut warning = Vec::new();
    let mut normal = 0;
    let mut unevaluable = 0;

    for record in records {
        match record.severity_with(thresholds) {
            Some(Severity::Critical) => critical.push(record.clone()),
            Some(Severity::Warning) => warning.push(record.clone()),
            Some(Severity::Normal) => normal += 1,
            None => unevaluable += 1,
        }
    }

    DecisionBatch::new(
        critical,
        warning,
        normal,
        unevaluable,
        force_notify,
        *thresholds,
    )
}

/// Evaluable records expiring within `days`, soonest first.
pub fn expiring_within(records: &[DomainRecord], days: i64) -> Vec<DomainRecord> {
    let mut expiring: Vec<DomainRecord> = records
        .iter()
        .filter(|r| r.days_until_expiration().is_some_and(|d| d <= days))
        .cloned()
        .collect();
    expiring.sort_by_key(|r| r.days_until_expiration());
    expiring
}

/// Every record with its tier, most urgent first. Unevaluable rows go last.
pub fn status_view(records: &[DomainRecord], thresholds: &ExpiryThresholds) -> Vec<StatusRow> {
    let mut rows: Vec<StatusRow> = records
        .iter()
        .map(|record| StatusRow {
            severity: record.severity_with(thresholds),
            record: record.clone(),
        })
        .collect();
    rows.sort_by_key(|row| row.severity.map(|s| s.priority()).unwrap_or(u8::MAX));
    rows
}

/// Stateless classifier that reports into the span it was built with.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    thresholds: ExpiryThresholds,
    span: Span,
}

impl DecisionEngine {
    pub fn new(span: Span) -> Self {
        Self {
            thresholds: ExpiryThresholds::REGISTRATION,
            span,
        }
    }

    pub fn with_thresholds(mut self, thresholds: ExpiryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &ExpiryThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, records: &[DomainRecord], force_notify: bool) -> DecisionBatch {
        let batch = classify_with(records, force_notify, &self.thresholds);

        self.span.in_scope(|| {
            if batch.total_evaluated() == 0 {
                tracing::info!("No domains to evaluate");
            } else {
                tracing::info!(
                    critical = batch.critical_count(),
                    warning = batch.warning_count(),
                    unevaluable = batch.unevaluable_count(),
                    "🔎 Evaluation complete: {} critical, {} warning",
                    batch.critical_count(),
                    batch.warning_count()
                );
            }
        });

        batch
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(Span::none())
    }
}
