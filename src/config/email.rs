use crate::utils::error::{Result, WatchError};
use crate::utils::validation::{
    validate_email_address, validate_non_empty_string, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP submission settings. When absent, email delivery is disabled.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub sender: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub secret: String,
}

fn default_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl EmailConfig {
    pub fn new(
        server: impl Into<String>,
        port: u16,
        sender: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            port,
            sender: sender.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }
}

// 密碼不可出現在日誌中
impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// 未設定的 ${VAR} 會原樣保留，在這裡擋下而不是等到 SMTP 認證失敗
fn validate_resolved(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(WatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: if field_name == "email.secret" {
                "<redacted>".to_string()
            } else {
                value.to_string()
            },
            reason: "Environment variable placeholder was not substituted".to_string(),
        });
    }
    Ok(())
}

impl Validate for EmailConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("email.server", &self.server)?;
        validate_range("email.port", self.port, 1, u16::MAX)?;
        validate_email_address("email.sender", &self.sender)?;
        validate_non_empty_string("email.username", &self.username)?;
        validate_non_empty_string("email.secret", &self.secret)?;
        validate_resolved("email.username", &self.username)?;
        validate_resolved("email.secret", &self.secret)?;
        Ok(())
    }
}
