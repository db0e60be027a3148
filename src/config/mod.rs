#[cfg(feature = "cli")]
pub mod cli;
pub mod email;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, LogFormat};
pub use email::EmailConfig;
pub use toml_config::{SourceKind, WatchConfig};
