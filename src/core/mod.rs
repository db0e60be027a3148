pub mod decision;
pub mod monitor;
pub mod notifier;
pub mod report;

pub use crate::domain::model::{DecisionBatch, DomainRecord, Severity};
pub use crate::domain::ports::{DomainReader, MailTransport};
pub use crate::utils::error::Result;
