use crate::domain::model::{DecisionBatch, DomainRecord};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::fmt;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ENTRY_RULE: &str = "----------------------------------------";
const UNKNOWN: &str = "N/A";

pub const ACTION_RENEW: &str = "RENEW URGENTLY";
pub const ACTION_MONITOR: &str = "Continue monitoring";

/// Plain-text rendering of one decision batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    generated_at: NaiveDateTime,
    text: String,
}

impl Report {
    pub fn generated_at(&self) -> NaiveDateTime {
        self.generated_at
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn render_report(batch: &DecisionBatch) -> Report {
    render_report_at(batch, Local::now().naive_local())
}

pub fn render_report_at(batch: &DecisionBatch, at: NaiveDateTime) -> Report {
    let thresholds = batch.thresholds();
    let mut lines = vec![
        "DOMAIN EXPIRY REPORT".to_string(),
        format!("Generated: {}", at.format(TIMESTAMP_FORMAT)),
        String::new(),
        format!(
            "=== CRITICAL DOMAINS (expire in {} days or less) ===",
            thresholds.critical_days
        ),
    ];

    if batch.critical().is_empty() {
        lines.push("No critical domains.".to_string());
    } else {
        for (index, record) in batch.critical().iter().enumerate() {
            push_entry(&mut lines, index + 1, record, true);
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "=== WARNING DOMAINS (expire in {}-{} days) ===",
        thresholds.critical_days + 1,
        thresholds.warning_days
    ));

    if batch.warning().is_empty() {
        lines.push("No warning domains.".to_string());
    } else {
        for (index, record) in batch.warning().iter().enumerate() {
            push_entry(&mut lines, index + 1, record, false);
        }
    }

    lines.push(String::new());
    lines.push("=== SUMMARY ===".to_string());
    lines.push(format!("Total domains evaluated: {}", batch.total_evaluated()));
    lines.push(format!("Critical domains: {}", batch.critical_count()));
    lines.push(format!("Warning domains: {}", batch.warning_count()));
    lines.push(String::new());
    lines.push(format!("Recommended action: {}", recommended_action(batch)));

    let mut text = lines.join("\n");
    text.push('\n');

    Report {
        generated_at: at,
        text,
    }
}

pub fn recommended_action(batch: &DecisionBatch) -> &'static str {
    if batch.critical_count() > 0 {
        ACTION_RENEW
    } else {
        ACTION_MONITOR
    }
}

fn push_entry(lines: &mut Vec<String>, position: usize, record: &DomainRecord, with_registrar: bool) {
    lines.push(String::new());
    lines.push(format!("{}. Domain: {}", position, record.domain()));
    lines.push(format!(
        "   Days until expiration: {}",
        record
            .days_until_expiration()
            .map(|d| d.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    ));
    lines.push(format!(
        "   Expiration date: {}",
        format_date(record.expiration_date())
    ));
    if with_registrar {
        lines.push(format!(
            "   Registrar: {}",
            record.registrar().unwrap_or(UNKNOWN)
        ));
    }
    lines.push(ENTRY_RULE.to_string());
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => format!("{} UTC", d.format(TIMESTAMP_FORMAT)),
        None => UNKNOWN.to_string(),
    }
}
