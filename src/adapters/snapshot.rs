use crate::adapters::{normalize_domain, parse_timestamp};
use crate::domain::model::DomainRecord;
use crate::domain::ports::DomainReader;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{Instrument, Span};

/// One row of a csv snapshot: `domain,expiration_date,registrar,status`.
/// Multiple status values are separated by `;`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    domain: String,
    #[serde(default)]
    expiration_date: Option<String>,
    #[serde(default)]
    registrar: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonRow {
    domain: String,
    #[serde(default)]
    expiration_date: Option<String>,
    #[serde(default)]
    registrar: Option<String>,
    #[serde(default)]
    status: Vec<String>,
}

struct SnapshotEntry {
    expiration_date: Option<String>,
    registrar: Option<String>,
    status: Vec<String>,
}

/// Serves records from a previously exported csv or json file.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    path: PathBuf,
    span: Span,
}

impl SnapshotReader {
    pub fn new(path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, SnapshotEntry>> {
        let data = std::fs::read(&self.path)?;
        let is_json = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let rows: Vec<(String, SnapshotEntry)> = if is_json {
            let rows: Vec<JsonRow> = serde_json::from_slice(&data)?;
            rows.into_iter()
                .map(|row| {
                    (
                        row.domain,
                        SnapshotEntry {
                            expiration_date: row.expiration_date,
                            registrar: row.registrar,
                            status: row.status,
                        },
                    )
                })
                .collect()
        } else {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(data.as_slice());
            let mut rows = Vec::new();
            for row in reader.deserialize::<CsvRow>() {
                let row = row?;
                let status = row
                    .status
                    .map(|s| {
                        s.split(';')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                rows.push((
                    row.domain,
                    SnapshotEntry {
                        expiration_date: row.expiration_date,
                        registrar: row.registrar,
                        status,
                    },
                ));
            }
            rows
        };

        let mut entries = HashMap::with_capacity(rows.len());
        for (domain, entry) in rows {
            match normalize_domain(&domain) {
                Ok(name) => {
                    entries.insert(name, entry);
                }
                Err(e) => tracing::warn!("Skipping snapshot row: {}", e),
            }
        }
        Ok(entries)
    }

    fn to_record(domain: String, entry: &SnapshotEntry, now: DateTime<Utc>) -> DomainRecord {
        let expiration_date = entry.expiration_date.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                tracing::warn!(domain = %domain, "Unrecognized expiration date '{}'", raw);
            }
            parsed
        });

        DomainRecord::observe(domain, expiration_date, now)
            .with_registrar(entry.registrar.clone())
            .with_status(entry.status.clone())
    }

    /// Every record in the snapshot, in no particular order.
    pub fn read_all(&self) -> Result<Vec<DomainRecord>> {
        let now = Utc::now();
        Ok(self
            .load()?
            .iter()
            .map(|(domain, entry)| Self::to_record(domain.clone(), entry, now))
            .collect())
    }
}

#[async_trait]
impl DomainReader for SnapshotReader {
    async fn read(&self, domains: &[String]) -> Vec<DomainRecord> {
        async {
            let entries = match self.load() {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(path = %self.path.display(), "❌ Could not load snapshot: {}", e);
                    return Vec::new();
                }
            };

            let now = Utc::now();
            let mut records = Vec::with_capacity(domains.len());

            for requested in domains {
                let name = match normalize_domain(requested) {
                    Ok(name) => name,
                    Err(e) => {
                        tracing::error!("❌ {}", e);
                        continue;
                    }
                };

                match entries.get(&name) {
                    Some(entry) => records.push(Self::to_record(name, entry, now)),
                    None => tracing::warn!(domain = %name, "Domain not present in snapshot"),
                }
            }

            tracing::info!(
                "Processed {} of {} domains successfully",
                records.len(),
                domains.len()
            );
            records
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[tokio::test]
    async fn test_csv_snapshot() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        let in_ten_days = (Utc::now() + chrono::Duration::days(10) + chrono::Duration::hours(1))
            .to_rfc3339();
        writeln!(file, "domain,expiration_date,registrar,status").unwrap();
        writeln!(file, "Example.com,{},Example Registrar,active;locked", in_ten_days).unwrap();
        writeln!(file, "nodate.org,,,").unwrap();
        file.flush().unwrap();

        let reader = SnapshotReader::new(file.path(), Span::none());
        let records = reader
            .read(&[
                "example.com".to_string(),
                "nodate.org".to_string(),
                "absent.net".to_string(),
            ])
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].domain(), "example.com");
        assert_eq!(records[0].days_until_expiration(), Some(10));
        assert_eq!(records[0].registrar(), Some("Example Registrar"));
        assert_eq!(records[0].status(), ["active", "locked"]);
        assert_eq!(records[1].domain(), "nodate.org");
        assert_eq!(records[1].days_until_expiration(), None);
    }

    #[tokio::test]
    async fn test_json_snapshot() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        let json = serde_json::json!([
            {"domain": "a.com", "expiration_date": "2001-01-01", "status": ["expired"]},
            {"domain": "b.com"}
        ]);
        file.write_all(json.to_string().as_bytes()).unwrap();
        file.flush().unwrap();

        let reader = SnapshotReader::new(file.path(), Span::none());
        let mut records = reader.read_all().unwrap();
        records.sort_by(|a, b| a.domain().cmp(b.domain()));

        assert_eq!(records.len(), 2);
        assert!(records[0].days_until_expiration().unwrap() < 0);
        assert_eq!(records[0].status(), ["expired"]);
        assert!(!records[1].is_evaluable());
    }

    #[tokio::test]
    async fn test_missing_snapshot_reads_nothing() {
        let reader = SnapshotReader::new("/nonexistent/domains.csv", Span::none());
        assert!(reader.read(&["a.com".to_string()]).await.is_empty());
        assert!(reader.read_all().is_err());
    }
}
