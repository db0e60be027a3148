use crate::config::email::EmailConfig;
use crate::domain::model::EmailMessage;
use crate::domain::ports::MailTransport;
use crate::utils::error::Result;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP submission over STARTTLS with username/password authentication.
///
/// A fresh connection is opened per message and closed after sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    pub fn new() -> Self {
        Self
    }
}

pub fn build_message(message: &EmailMessage) -> Result<Message> {
    let mut builder = Message::builder()
        .from(message.from.parse::<Mailbox>()?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &message.to {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    Ok(builder.body(message.body.clone())?)
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, config: &EmailConfig, message: &EmailMessage) -> Result<()> {
        let email = build_message(message)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.secret.clone(),
            ))
            .build();

        tracing::debug!(
            server = %config.server,
            port = config.port,
            username = %config.username,
            "Connecting to SMTP server"
        );
        transport.send(email).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            from: "alerts@example.com".to_string(),
            to: vec!["ops@example.com".to_string(), "dev@example.com".to_string()],
            subject: "ALERT: 1 domains critically close to expiry".to_string(),
            body: "DOMAIN EXPIRY REPORT\n".to_string(),
        }
    }

    #[test]
    fn test_build_message_addresses_every_recipient() {
        let built = build_message(&message()).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();

        assert!(raw.contains("From: alerts@example.com"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("dev@example.com"));
        assert!(raw.contains("Subject: ALERT: 1 domains critically close to expiry"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert_eq!(built.envelope().to().len(), 2);
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let mut bad = message();
        bad.to.push("not an address".to_string());
        assert!(build_message(&bad).is_err());
    }

    #[test]
    fn test_build_message_accepts_what_config_validation_accepts() {
        use crate::utils::validation::validate_email_address;

        let mut named = message();
        named.from = "Domain Watch <alerts@example.com>".to_string();
        named.to = vec!["ops@localhost".to_string()];

        assert!(validate_email_address("email.sender", &named.from).is_ok());
        assert!(validate_email_address("monitor.recipients", &named.to[0]).is_ok());

        let raw = String::from_utf8(build_message(&named).unwrap().formatted()).unwrap();
        assert!(raw.contains("Domain Watch"));
        assert!(raw.contains("<alerts@example.com>"));
    }
}
