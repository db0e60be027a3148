use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lookup request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Email message error: {0}")]
    EmailBuildError(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    AddressError(#[from] lettre::address::AddressError),

    #[error("SMTP transport error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Lookup failed for {domain}: {message}")]
    LookupError { domain: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl WatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WatchError::IoError(_) => ErrorCategory::Storage,
            WatchError::HttpError(_) | WatchError::LookupError { .. } => ErrorCategory::Network,
            WatchError::CsvError(_) | WatchError::SerializationError(_) => ErrorCategory::Data,
            WatchError::EmailBuildError(_)
            | WatchError::AddressError(_)
            | WatchError::SmtpError(_) => ErrorCategory::Delivery,
            WatchError::ConfigError { .. }
            | WatchError::ConfigValidationError { .. }
            | WatchError::InvalidConfigValueError { .. }
            | WatchError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一網域查詢失敗不影響整體執行
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            WatchError::IoError(e) => format!("Could not read or write a file: {}", e),
            WatchError::HttpError(_) | WatchError::LookupError { .. } => {
                format!("A domain lookup failed: {}", self)
            }
            WatchError::CsvError(_) | WatchError::SerializationError(_) => {
                format!("The domain snapshot could not be parsed: {}", self)
            }
            WatchError::EmailBuildError(_)
            | WatchError::AddressError(_)
            | WatchError::SmtpError(_) => format!("The alert email could not be sent: {}", self),
            WatchError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            _ => format!("The configuration is invalid: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML configuration file and command line arguments"
            }
            ErrorCategory::Network => "Check network connectivity and the lookup endpoint",
            ErrorCategory::Storage => "Check that the log and snapshot paths are accessible",
            ErrorCategory::Data => "Check the snapshot file format (csv or json)",
            ErrorCategory::Delivery => "Check the [email] server, port and credentials",
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
