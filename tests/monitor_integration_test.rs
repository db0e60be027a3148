use async_trait::async_trait;
use chrono::{Duration, Utc};
use domain_watch::{
    DispatchSettings, DomainMonitor, DomainReader, EmailConfig, EmailMessage, MailTransport,
    RdapReader, Result, SnapshotReader, WatchConfig,
};
use httpmock::prelude::*;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::Span;

#[derive(Clone, Default)]
struct SharedTransport {
    delivered: Arc<Mutex<Vec<EmailMessage>>>,
}

#[async_trait]
impl MailTransport for SharedTransport {
    async fn deliver(&self, _config: &EmailConfig, message: &EmailMessage) -> Result<()> {
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn rdap_body(days_from_now: i64) -> serde_json::Value {
    // 多加一小時，避免整數天數邊界
    let expires = Utc::now() + Duration::days(days_from_now) + Duration::hours(1);
    serde_json::json!({
        "objectClassName": "domain",
        "events": [
            {"eventAction": "expiration", "eventDate": expires.to_rfc3339()}
        ],
        "entities": [{
            "roles": ["registrar"],
            "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar, Inc."]]]
        }]
    })
}

fn settings(dir: &TempDir, recipients: &[&str]) -> DispatchSettings {
    DispatchSettings {
        log_path: dir.path().join("logs").join("domain_alerts.log"),
        recipients: recipients.iter().map(|r| r.to_string()).collect(),
        email: Some(EmailConfig::new(
            "smtp.example.com",
            587,
            "alerts@example.com",
            "alerts",
            "pw",
        )),
        force_notify: false,
    }
}

#[tokio::test]
async fn test_end_to_end_with_rdap_server() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let critical = server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/urgent.com");
            then.status(200)
                .header("Content-Type", "application/rdap+json")
                .json_body(rdap_body(7));
        })
        .await;
    let warning = server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/soon.org");
            then.status(200)
                .header("Content-Type", "application/rdap+json")
                .json_body(rdap_body(42));
        })
        .await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/unknown.net");
            then.status(404);
        })
        .await;

    let reader = RdapReader::new(
        server.base_url(),
        std::time::Duration::from_secs(5),
        Span::none(),
    )
    .unwrap();
    let transport = SharedTransport::default();
    let settings = settings(&dir, &["ops@example.com"]);
    let log_path = settings.log_path.clone();
    let monitor = DomainMonitor::new(reader, transport.clone(), settings);

    let domains = vec![
        "https://www.Urgent.com/".to_string(),
        "soon.org".to_string(),
        "unknown.net".to_string(),
    ];
    let summary = monitor.run(&domains).await;

    critical.assert_async().await;
    warning.assert_async().await;
    missing.assert_async().await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed_lookups, 1);
    assert!(summary.is_success());
    assert!(summary.log_written);
    assert!(summary.email_sent);

    let batch = summary.decision.as_ref().unwrap();
    assert_eq!(batch.critical()[0].domain(), "urgent.com");
    assert_eq!(batch.critical()[0].days_until_expiration(), Some(7));
    assert_eq!(
        batch.critical()[0].registrar(),
        Some("Example Registrar, Inc.")
    );
    assert_eq!(batch.warning()[0].domain(), "soon.org");

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("- urgent.com: 7 days"));
    assert!(log.contains("Summary: 1 critical, 1 warning"));

    let delivered = transport.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].body.contains("Registrar: Example Registrar, Inc."));
    assert!(delivered[0].body.contains("Recommended action: RENEW URGENTLY"));
}

#[tokio::test]
async fn test_rdap_server_error_drops_domain() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/broken.com");
            then.status(500);
        })
        .await;

    let reader = RdapReader::new(
        server.base_url(),
        std::time::Duration::from_secs(5),
        Span::none(),
    )
    .unwrap();

    assert!(reader.lookup("broken.com").await.is_err());
    assert!(reader.read(&["broken.com".to_string()]).await.is_empty());
}

#[tokio::test]
async fn test_quiet_run_from_config_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("domains.csv");
    let expires = (Utc::now() + Duration::days(120)).format("%Y-%m-%d").to_string();
    std::fs::write(
        &snapshot,
        format!(
            "domain,expiration_date,registrar,status\nquiet.com,{},Registrar,active\n",
            expires
        ),
    )
    .unwrap();
    let log_path = dir.path().join("alerts.log");

    let config = WatchConfig::from_toml_str(&format!(
        r#"
[monitor]
domains = ["quiet.com"]
recipients = ["ops@example.com"]

[source]
type = "snapshot"
path = "{}"

[log]
path = "{}"
"#,
        snapshot.display(),
        log_path.display()
    ))
    .unwrap();

    let reader = SnapshotReader::new(config.source.path.clone().unwrap(), Span::none());
    let transport = SharedTransport::default();
    let monitor = DomainMonitor::new(reader, transport.clone(), DispatchSettings::from(&config));

    let summary = monitor.run(&config.monitor.domains).await;

    let batch = summary.decision.as_ref().unwrap();
    assert_eq!(batch.normal_count(), 1);
    assert!(!batch.should_notify());
    assert!(!summary.log_written);
    assert!(!summary.email_sent);
    assert!(summary.is_success());
    assert!(!log_path.exists());
    assert!(transport.delivered.lock().unwrap().is_empty());
}
