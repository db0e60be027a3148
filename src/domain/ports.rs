use crate::config::email::EmailConfig;
use crate::domain::model::{DomainRecord, EmailMessage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Produces one record per domain it could resolve. Failed lookups are
/// dropped from the result, never returned as placeholder records.
#[async_trait]
pub trait DomainReader: Send + Sync {
    async fn read(&self, domains: &[String]) -> Vec<DomainRecord>;
}

/// Delivers one message to all of its recipients in a single session:
/// connect, upgrade to TLS, authenticate, send, close.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, config: &EmailConfig, message: &EmailMessage) -> Result<()>;
}
