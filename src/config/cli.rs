use crate::config::toml_config::{SourceKind, WatchConfig};
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "domain-watch")]
#[command(about = "Checks domain registration expiry and raises alerts")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Domains to check, overrides [monitor].domains
    #[arg(short, long, value_delimiter = ',')]
    pub domains: Vec<String>,

    /// Alert recipients, overrides [monitor].recipients
    #[arg(short, long, value_delimiter = ',')]
    pub recipients: Vec<String>,

    /// Send the report email even when nothing is critical
    #[arg(long)]
    pub force_notify: bool,

    /// Alert log destination, overrides [log].path
    #[arg(long)]
    pub log_file: Option<String>,

    /// Read records from a csv/json snapshot instead of RDAP
    #[arg(long)]
    pub snapshot: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Classify and print the report without writing the log or sending email
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 載入設定檔（若有），再套用命令列覆蓋值
    pub fn load(&self) -> Result<WatchConfig> {
        let mut config = match &self.config {
            Some(path) => WatchConfig::from_file(path)?,
            None => WatchConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut WatchConfig) {
        if !self.domains.is_empty() {
            config.monitor.domains = self.domains.clone();
        }
        if !self.recipients.is_empty() {
            config.monitor.recipients = self.recipients.clone();
        }
        if self.force_notify {
            config.monitor.force_notify = true;
        }
        if let Some(log_file) = &self.log_file {
            config.log.path = log_file.clone();
        }
        if let Some(snapshot) = &self.snapshot {
            config.source.r#type = SourceKind::Snapshot;
            config.source.path = Some(snapshot.clone());
        }
    }
}
