//! TLS certificate expiry evaluation.
//!
//! Fetching the certificate is left to the caller; this module only judges
//! an already-observed certificate.

use crate::domain::model::{days_between, ExpiryThresholds, Severity};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const COMMON_NAME: &str = "commonName";
pub const ORGANIZATION_NAME: &str = "organizationName";

const CERTIFICATE_DATE_FORMATS: [&str; 3] = [
    "%b %d %H:%M:%S %Y", // Jan 1 00:00:00 2025 GMT
    "%Y%m%d%H%M%SZ",     // 20250101000000Z
    "%Y-%m-%d %H:%M:%S", // 2025-01-01 00:00:00
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateRecord {
    domain: String,
    serial_number: Option<String>,
    issuer: BTreeMap<String, String>,
    subject: BTreeMap<String, String>,
    dns_names: Vec<String>,
    not_before: Option<DateTime<Utc>>,
    not_after: Option<DateTime<Utc>>,
    days_until_expiration: Option<i64>,
    checked_at: DateTime<Utc>,
}

impl CertificateRecord {
    pub fn observe(
        domain: impl Into<String>,
        not_after: Option<DateTime<Utc>>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            domain: domain.into(),
            serial_number: None,
            issuer: BTreeMap::new(),
            subject: BTreeMap::new(),
            dns_names: Vec::new(),
            not_before: None,
            not_after,
            days_until_expiration: not_after.map(|end| days_between(checked_at, end)),
            checked_at,
        }
    }

    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    pub fn with_issuer(mut self, issuer: BTreeMap<String, String>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_subject(mut self, subject: BTreeMap<String, String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_dns_names(mut self, dns_names: Vec<String>) -> Self {
        self.dns_names = dns_names;
        self
    }

    pub fn with_not_before(mut self, not_before: Option<DateTime<Utc>>) -> Self {
        self.not_before = not_before;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn issuer(&self) -> &BTreeMap<String, String> {
        &self.issuer
    }

    pub fn subject(&self) -> &BTreeMap<String, String> {
        &self.subject
    }

    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    pub fn not_after(&self) -> Option<DateTime<Utc>> {
        self.not_after
    }

    pub fn days_until_expiration(&self) -> Option<i64> {
        self.days_until_expiration
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// True when the subject CN or a SAN DNS entry covers the queried domain.
    pub fn is_valid_for_domain(&self) -> bool {
        let cn_matches = self
            .subject
            .get(COMMON_NAME)
            .is_some_and(|cn| hostname_matches(cn, &self.domain));

        cn_matches
            || self
                .dns_names
                .iter()
                .any(|name| hostname_matches(name, &self.domain))
    }

    /// Issuer organization equal to issuer CN usually means nobody else signed it.
    pub fn looks_self_signed(&self) -> bool {
        match (
            self.issuer.get(ORGANIZATION_NAME),
            self.issuer.get(COMMON_NAME),
        ) {
            (Some(org), Some(cn)) => org == cn,
            _ => false,
        }
    }
}

/// Case-insensitive hostname match. A leading `*.` covers exactly one label.
pub fn hostname_matches(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.trim().trim_end_matches('.').to_ascii_lowercase();
    let hostname = hostname.trim().trim_end_matches('.').to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => match hostname.strip_suffix(base) {
            Some(prefix) => {
                let label = prefix.strip_suffix('.').unwrap_or("");
                !label.is_empty() && !label.contains('.')
            }
            None => false,
        },
        None => pattern == hostname,
    }
}

/// Parses the validity dates found in peer certificate dumps.
pub fn parse_certificate_date(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = normalized
        .strip_suffix(" GMT")
        .or_else(|| normalized.strip_suffix(" UTC"))
        .unwrap_or(&normalized);

    CERTIFICATE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateAlerts {
    pub critical: Vec<String>,
    pub warnings: Vec<String>,
    pub informational: Vec<String>,
}

impl CertificateAlerts {
    pub fn is_clean(&self) -> bool {
        self.critical.is_empty() && self.warnings.is_empty()
    }
}

pub fn certificate_alerts(
    record: &CertificateRecord,
    thresholds: &ExpiryThresholds,
) -> CertificateAlerts {
    let mut alerts = CertificateAlerts::default();

    if let Some(days) = record.days_until_expiration() {
        match thresholds.severity_of(days) {
            Severity::Critical => alerts
                .critical
                .push(format!("Certificate expires in {} days", days)),
            Severity::Warning => alerts
                .warnings
                .push(format!("Certificate expires in {} days", days)),
            Severity::Normal => alerts
                .informational
                .push(format!("Certificate is valid for {} days", days)),
        }
    }

    if !record.is_valid_for_domain() {
        alerts
            .critical
            .push("Certificate is not valid for this domain".to_string());
    }

    if record.looks_self_signed() {
        alerts
            .warnings
            .push("Possible self-signed certificate".to_string());
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn names(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn checked_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_hostname_matches() {
        assert!(hostname_matches("example.com", "EXAMPLE.com"));
        assert!(hostname_matches("*.example.com", "www.example.com"));
        assert!(!hostname_matches("*.example.com", "example.com"));
        assert!(!hostname_matches("*.example.com", "a.b.example.com"));
        assert!(!hostname_matches("*.example.com", "notexample.com"));
        assert!(!hostname_matches("other.com", "example.com"));
    }

    #[test]
    fn test_parse_certificate_date() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_certificate_date("Jan  1 00:00:00 2025 GMT"), Some(expected));
        assert_eq!(parse_certificate_date("20250101000000Z"), Some(expected));
        assert_eq!(parse_certificate_date("2025-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_certificate_date("not a date"), None);
    }

    #[test]
    fn test_expiring_certificate_for_wrong_host() {
        let record = CertificateRecord::observe(
            "shop.example.com",
            Some(checked_at() + Duration::days(10)),
            checked_at(),
        )
        .with_subject(names(&[(COMMON_NAME, "example.com")]))
        .with_dns_names(vec!["example.com".into(), "www.example.com".into()]);

        let alerts = certificate_alerts(&record, &ExpiryThresholds::CERTIFICATE);
        assert_eq!(alerts.critical.len(), 2);
        assert!(alerts.critical[0].contains("10 days"));
        assert!(alerts.critical[1].contains("not valid"));
        assert!(!alerts.is_clean());
    }

    #[test]
    fn test_certificate_warning_window_uses_sixty_days() {
        let record = CertificateRecord::observe(
            "www.example.com",
            Some(checked_at() + Duration::days(55)),
            checked_at(),
        )
        .with_dns_names(vec!["*.example.com".into()]);

        let alerts = certificate_alerts(&record, &ExpiryThresholds::CERTIFICATE);
        assert!(alerts.critical.is_empty());
        assert_eq!(alerts.warnings, vec!["Certificate expires in 55 days"]);
    }

    #[test]
    fn test_self_signed_detection() {
        let record = CertificateRecord::observe(
            "example.com",
            Some(checked_at() + Duration::days(200)),
            checked_at(),
        )
        .with_subject(names(&[(COMMON_NAME, "example.com")]))
        .with_issuer(names(&[
            (COMMON_NAME, "Example Internal"),
            (ORGANIZATION_NAME, "Example Internal"),
        ]));

        let alerts = certificate_alerts(&record, &ExpiryThresholds::CERTIFICATE);
        assert!(alerts.critical.is_empty());
        assert_eq!(alerts.warnings, vec!["Possible self-signed certificate"]);
        assert_eq!(alerts.informational, vec!["Certificate is valid for 200 days"]);
    }

    #[test]
    fn test_missing_issuer_names_are_not_self_signed() {
        let record = CertificateRecord::observe("example.com", None, checked_at());
        assert!(!record.looks_self_signed());
    }
}
