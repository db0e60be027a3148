// Adapters layer: concrete readers and transports behind the domain ports.

pub mod rdap;
pub mod smtp;
pub mod snapshot;

pub use rdap::RdapReader;
pub use smtp::SmtpMailer;
pub use snapshot::SnapshotReader;

use crate::utils::error::{Result, WatchError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Lowercases and strips scheme, path and a leading `www.` from user input.
pub fn normalize_domain(domain: &str) -> Result<String> {
    let domain = domain.trim().to_lowercase();

    let domain = domain
        .strip_prefix("http://")
        .or_else(|| domain.strip_prefix("https://"))
        .unwrap_or(&domain);
    let domain = domain.split('/').next().unwrap_or(domain);
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    let domain = domain.trim_end_matches('.');

    // 每個 label 不可為空，也不可以連字號開頭或結尾
    let valid = domain.contains('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'));

    if !valid {
        return Err(WatchError::LookupError {
            domain: domain.to_string(),
            message: "not a valid domain name".to_string(),
        });
    }

    Ok(domain.to_string())
}

/// Parses the timestamp shapes registries and snapshot files use.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
