pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, LogFormat};

pub use adapters::{RdapReader, SmtpMailer, SnapshotReader};
pub use config::{EmailConfig, SourceKind, WatchConfig};
pub use crate::core::decision::{classify, classify_with, DecisionEngine};
pub use crate::core::monitor::{DispatchSettings, DomainMonitor, RunSummary};
pub use crate::core::notifier::{append_log, send_email, Notifier};
pub use crate::core::report::{render_report, Report};
pub use domain::model::{
    DecisionBatch, DomainRecord, EmailMessage, ExpiryThresholds, Severity, StatusRow,
};
pub use domain::ports::{DomainReader, MailTransport};
pub use utils::error::{Result, WatchError};
