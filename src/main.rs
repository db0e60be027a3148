use clap::Parser;
use domain_watch::utils::error::ErrorSeverity;
use domain_watch::utils::{logger, validation::Validate};
use domain_watch::{
    CliConfig, DispatchSettings, DomainMonitor, DomainReader, LogFormat, RdapReader, SmtpMailer,
    SnapshotReader, SourceKind, WatchConfig, WatchError,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting domain-watch CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    let exit_code = match config.source.r#type {
        SourceKind::Rdap => {
            let reader = match RdapReader::new(
                config.source.endpoint.clone(),
                Duration::from_secs(config.timeout_seconds()),
                tracing::info_span!("rdap_reader"),
            ) {
                Ok(reader) => reader,
                Err(e) => fail(e),
            };
            execute(reader, &config, cli.dry_run).await
        }
        SourceKind::Snapshot => {
            // validate() 已確認 path 存在
            let path = config.source.path.clone().unwrap_or_default();
            let reader = SnapshotReader::new(path, tracing::info_span!("snapshot_reader"));
            execute(reader, &config, cli.dry_run).await
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn execute<R: DomainReader>(reader: R, config: &WatchConfig, dry_run: bool) -> i32 {
    let monitor = DomainMonitor::new(reader, SmtpMailer::new(), DispatchSettings::from(config));
    let domains = &config.monitor.domains;

    if dry_run {
        tracing::info!("🔍 Dry run: nothing will be logged or sent");
        return match monitor.preview(domains).await {
            Some((_, report)) => {
                println!("{}", report);
                0
            }
            None => {
                eprintln!("❌ No domain information could be retrieved");
                2
            }
        };
    }

    let summary = monitor.run(domains).await;
    println!("{}", summary);

    if let Some(batch) = &summary.decision {
        if batch.should_notify() && !summary.email_sent {
            tracing::warn!("📧 Alert was due but no email went out");
        }
    }

    if summary.is_success() {
        0
    } else {
        tracing::error!("❌ Monitoring run finished with {} errors", summary.errors.len());
        2
    }
}

fn fail(e: WatchError) -> ! {
    tracing::error!(
        "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
