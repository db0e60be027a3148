use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// 到期天數 <= 30 為緊急
pub const CRITICAL_DAYS: i64 = 30;
/// 到期天數 <= 50 為警告
pub const WARNING_DAYS: i64 = 50;
/// TLS 憑證的警告範圍較寬
pub const CERTIFICATE_WARNING_DAYS: i64 = 60;

const SECONDS_PER_DAY: i64 = 86_400;

/// Inclusive day boundaries for the critical and warning tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryThresholds {
    pub critical_days: i64,
    pub warning_days: i64,
}

impl ExpiryThresholds {
    /// Domain registration expiry: critical at 30 days, warning at 50.
    pub const REGISTRATION: Self = Self {
        critical_days: CRITICAL_DAYS,
        warning_days: WARNING_DAYS,
    };

    /// TLS certificate expiry: critical at 30 days, warning at 60.
    pub const CERTIFICATE: Self = Self {
        critical_days: CRITICAL_DAYS,
        warning_days: CERTIFICATE_WARNING_DAYS,
    };

    pub fn severity_of(&self, days: i64) -> Severity {
        if days <= self.critical_days {
            Severity::Critical
        } else if days <= self.warning_days {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

impl Default for ExpiryThresholds {
    fn default() -> Self {
        Self::REGISTRATION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Normal,
}

impl Severity {
    /// 1 = most urgent
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Critical => 1,
            Severity::Warning => 2,
            Severity::Normal => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One domain's observed registration state at `queried_at`.
///
/// A record is a snapshot: `days_until_expiration` is computed once when the
/// record is created and never recomputed. Re-evaluating a domain later
/// requires reading a fresh record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRecord {
    domain: String,
    expiration_date: Option<DateTime<Utc>>,
    days_until_expiration: Option<i64>,
    registrar: Option<String>,
    status: Vec<String>,
    queried_at: DateTime<Utc>,
}

impl DomainRecord {
    /// Builds a record from an observed expiration date, deriving the day
    /// count as `floor(expiration_date - queried_at)`.
    pub fn observe(
        domain: impl Into<String>,
        expiration_date: Option<DateTime<Utc>>,
        queried_at: DateTime<Utc>,
    ) -> Self {
        let days_until_expiration = expiration_date.map(|expires| days_between(queried_at, expires));

        Self {
            domain: domain.into(),
            expiration_date,
            days_until_expiration,
            registrar: None,
            status: Vec::new(),
            queried_at,
        }
    }

    /// Builds a record that expires exactly `days` days after `queried_at`.
    ///
    /// When `queried_at + days` falls outside the representable date range
    /// the expiry cannot be stated, so the record is unevaluable, the same as
    /// passing `None`. Day counts and dates are always both present or both
    /// absent.
    pub fn from_days(domain: impl Into<String>, days: Option<i64>, queried_at: DateTime<Utc>) -> Self {
        let expiration_date = days
            .and_then(Duration::try_days)
            .and_then(|delta| queried_at.checked_add_signed(delta));
        Self::observe(domain, expiration_date, queried_at)
    }

    pub fn with_registrar(mut self, registrar: Option<String>) -> Self {
        self.registrar = registrar.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_status(mut self, status: Vec<String>) -> Self {
        self.status = status;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    pub fn days_until_expiration(&self) -> Option<i64> {
        self.days_until_expiration
    }

    pub fn registrar(&self) -> Option<&str> {
        self.registrar.as_deref()
    }

    pub fn status(&self) -> &[String] {
        &self.status
    }

    pub fn queried_at(&self) -> DateTime<Utc> {
        self.queried_at
    }

    /// `None` when the record carries no expiry data.
    pub fn severity(&self) -> Option<Severity> {
        self.severity_with(&ExpiryThresholds::REGISTRATION)
    }

    pub fn severity_with(&self, thresholds: &ExpiryThresholds) -> Option<Severity> {
        self.days_until_expiration
            .map(|days| thresholds.severity_of(days))
    }

    pub fn is_evaluable(&self) -> bool {
        self.days_until_expiration.is_some()
    }
}

/// Whole days from `from` to `to`, rounded toward negative infinity.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Result of one classification pass. Built only by the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionBatch {
    critical: Vec<DomainRecord>,
    warning: Vec<DomainRecord>,
    normal: usize,
    unevaluable: usize,
    should_notify: bool,
    should_log: bool,
    total_evaluated: usize,
    thresholds: ExpiryThresholds,
}

impl DecisionBatch {
    pub(crate) fn empty(thresholds: ExpiryThresholds) -> Self {
        Self {
            critical: Vec::new(),
            warning: Vec::new(),
            normal: 0,
            unevaluable: 0,
            should_notify: false,
            should_log: false,
            total_evaluated: 0,
            thresholds,
        }
    }

    pub(crate) fn new(
        critical: Vec<DomainRecord>,
        warning: Vec<DomainRecord>,
        normal: usize,
        unevaluable: usize,
        force_notify: bool,
        thresholds: ExpiryThresholds,
    ) -> Self {
        let has_critical = !critical.is_empty();
        let total_evaluated = critical.len() + warning.len() + normal + unevaluable;

        Self {
            critical,
            warning,
            normal,
            unevaluable,
            should_notify: has_critical || force_notify,
            should_log: has_critical,
            total_evaluated,
            thresholds,
        }
    }

    pub fn critical(&self) -> &[DomainRecord] {
        &self.critical
    }

    pub fn warning(&self) -> &[DomainRecord] {
        &self.warning
    }

    pub fn critical_count(&self) -> usize {
        self.critical.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warning.len()
    }

    pub fn normal_count(&self) -> usize {
        self.normal
    }

    pub fn unevaluable_count(&self) -> usize {
        self.unevaluable
    }

    pub fn should_notify(&self) -> bool {
        self.should_notify
    }

    pub fn should_log(&self) -> bool {
        self.should_log
    }

    pub fn total_evaluated(&self) -> usize {
        self.total_evaluated
    }

    pub fn thresholds(&self) -> &ExpiryThresholds {
        &self.thresholds
    }
}

/// A record paired with its tier, for priority-ordered status listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub record: DomainRecord,
    pub severity: Option<Severity>,
}

/// A fully addressed plain-text message, ready for a `MailTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_are_floored() {
        let queried_at = now();
        // 一天半之後到期
        let expires = queried_at + Duration::hours(36);
        let record = DomainRecord::observe("example.com", Some(expires), queried_at);
        assert_eq!(record.days_until_expiration(), Some(1));

        // 已過期半天，向下取整為 -1
        let expired = queried_at - Duration::hours(12);
        let record = DomainRecord::observe("example.com", Some(expired), queried_at);
        assert_eq!(record.days_until_expiration(), Some(-1));
    }

    #[test]
    fn test_days_present_iff_expiration_present() {
        let record = DomainRecord::observe("example.com", None, now());
        assert!(record.expiration_date().is_none());
        assert!(record.days_until_expiration().is_none());
        assert!(!record.is_evaluable());
        assert_eq!(record.severity(), None);

        let record = DomainRecord::from_days("example.com", Some(12), now());
        assert_eq!(record.expiration_date(), Some(now() + Duration::days(12)));
        assert_eq!(record.days_until_expiration(), Some(12));
    }

    #[test]
    fn test_severity_boundaries() {
        let t = ExpiryThresholds::REGISTRATION;
        assert_eq!(t.severity_of(-3), Severity::Critical);
        assert_eq!(t.severity_of(30), Severity::Critical);
        assert_eq!(t.severity_of(31), Severity::Warning);
        assert_eq!(t.severity_of(50), Severity::Warning);
        assert_eq!(t.severity_of(51), Severity::Normal);
    }

    #[test]
    fn test_certificate_thresholds_extend_warning_window() {
        let t = ExpiryThresholds::CERTIFICATE;
        assert_eq!(t.severity_of(55), Severity::Warning);
        assert_eq!(t.severity_of(60), Severity::Warning);
        assert_eq!(t.severity_of(61), Severity::Normal);
    }

    #[test]
    fn test_blank_registrar_is_dropped() {
        let record =
            DomainRecord::from_days("example.com", Some(10), now()).with_registrar(Some("  ".into()));
        assert_eq!(record.registrar(), None);
    }

    #[test]
    fn test_out_of_range_days_are_unevaluable() {
        let record = DomainRecord::from_days("far.com", Some(i64::MAX), now());
        assert!(!record.is_evaluable());
        assert!(record.expiration_date().is_none());
        assert_eq!(record.severity(), None);

        let record = DomainRecord::from_days("past.com", Some(-1_000_000_000), now());
        assert!(!record.is_evaluable());

        // 一般範圍內的天數仍然精確
        let record = DomainRecord::from_days("near.com", Some(36_500), now());
        assert_eq!(record.days_until_expiration(), Some(36_500));
    }
}
