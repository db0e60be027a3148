use crate::adapters::{normalize_domain, parse_timestamp};
use crate::domain::model::DomainRecord;
use crate::domain::ports::DomainReader;
use crate::utils::error::{Result, WatchError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{Instrument, Span};

const USER_AGENT: &str = concat!("domain-watch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapDomain {
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    events: Vec<RdapEvent>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEvent {
    event_action: String,
    #[serde(default)]
    event_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEntity {
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    vcard_array: Option<serde_json::Value>,
}

impl RdapDomain {
    fn expiration(&self) -> Option<chrono::DateTime<Utc>> {
        self.events
            .iter()
            .find(|e| e.event_action.eq_ignore_ascii_case("expiration"))
            .and_then(|e| e.event_date.as_deref())
            .and_then(parse_timestamp)
    }

    fn registrar(&self) -> Option<String> {
        self.entities
            .iter()
            .find(|e| e.roles.iter().any(|r| r == "registrar"))
            .and_then(|e| e.vcard_name().or_else(|| e.handle.clone()))
    }
}

impl RdapEntity {
    // vcardArray: ["vcard", [["fn", {}, "text", "Name"], ...]]
    fn vcard_name(&self) -> Option<String> {
        self.vcard_array
            .as_ref()?
            .get(1)?
            .as_array()?
            .iter()
            .find(|prop| prop.get(0).and_then(|v| v.as_str()) == Some("fn"))?
            .get(3)?
            .as_str()
            .map(|s| s.to_string())
    }
}

/// Reads registration expiry from an RDAP service (`{endpoint}/domain/{name}`).
#[derive(Debug, Clone)]
pub struct RdapReader {
    client: Client,
    endpoint: String,
    span: Span,
}

impl RdapReader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, span: Span) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            span,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn lookup(&self, domain: &str) -> Result<DomainRecord> {
        let domain = normalize_domain(domain)?;
        let url = format!("{}/domain/{}", self.endpoint, domain);

        tracing::debug!("Making RDAP request to: {}", url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/rdap+json, application/json")
            .send()
            .await?;

        tracing::debug!("RDAP response status: {}", response.status());
        if !response.status().is_success() {
            return Err(WatchError::LookupError {
                domain,
                message: format!("RDAP server returned HTTP {}", response.status()),
            });
        }

        let body: RdapDomain = response.json().await?;
        let record = DomainRecord::observe(domain, body.expiration(), Utc::now())
            .with_registrar(body.registrar())
            .with_status(body.status);

        Ok(record)
    }
}

#[async_trait]
impl DomainReader for RdapReader {
    async fn read(&self, domains: &[String]) -> Vec<DomainRecord> {
        async {
            let mut records = Vec::with_capacity(domains.len());

            for domain in domains {
                match self.lookup(domain).await {
                    Ok(record) => {
                        match record.days_until_expiration() {
                            Some(days) => tracing::info!(
                                domain = %record.domain(),
                                "Information retrieved: {} days until expiration",
                                days
                            ),
                            None => tracing::warn!(
                                domain = %record.domain(),
                                "No expiration date published"
                            ),
                        }
                        records.push(record);
                    }
                    Err(e) => {
                        tracing::error!(domain = %domain, "❌ Lookup failed: {}", e);
                    }
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

    #[test]
    fn test_parse_rdap_domain() {
        let body: RdapDomain = serde_json::from_value(serde_json::json!({
            "objectClassName": "domain",
            "ldhName": "EXAMPLE.COM",
            "status": ["client transfer prohibited"],
            "events": [
                {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
                {"eventAction": "expiration", "eventDate": "2026-08-13T04:00:00Z"}
            ],
            "entities": [{
                "objectClassName": "entity",
                "handle": "376",
                "roles": ["registrar"],
                "vcardArray": ["vcard", [
                    ["version", {}, "text", "4.0"],
                    ["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"]
                ]]
            }]
        }))
        .unwrap();

        assert_eq!(
            body.expiration().map(|d| d.to_rfc3339()),
            Some("2026-08-13T04:00:00+00:00".to_string())
        );
        assert_eq!(
            body.registrar().as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(body.status, vec!["client transfer prohibited"]);
    }

    #[test]
    fn test_registrar_falls_back_to_handle() {
        let body: RdapDomain = serde_json::from_value(serde_json::json!({
            "entities": [
                {"handle": "REG-1", "roles": ["registrant"]},
                {"handle": "292", "roles": ["registrar"]}
            ]
        }))
        .unwrap();

        assert_eq!(body.registrar().as_deref(), Some("292"));
        assert!(body.expiration().is_none());
    }
}
