//! Horizon API client for account operation history
//!
//! Pages through `/accounts/{id}/operations` newest first, stopping at the
//! record cap, an empty page, or once a page reaches past the lookback window.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::HorizonConfig;
use crate::error::{Error, Result};
use crate::ledger::{LedgerSource, LookbackWindow, MAX_RECORDS};

/// Horizon REST client
pub struct HorizonClient {
    /// HTTP client
    client: Client,
    /// Horizon root URL
    base_url: Url,
    /// Per-request timeout
    timeout: Duration,
    /// First retry delay
    retry_base_delay: Duration,
    /// Give up retrying a page after this long
    retry_max_elapsed: Duration,
}

impl HorizonClient {
    /// Create a client from configuration
    pub fn from_config(config: &HorizonConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| config.network.horizon_url().to_string());

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Url::parse(&base_url)?,
            timeout,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            retry_max_elapsed: Duration::from_millis(config.retry_max_elapsed_ms),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// First-page URL for an account's operations
    fn operations_url(&self, address: &str, page_size: u32) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["accounts", address, "operations"]);
        url.query_pairs_mut()
            .append_pair("order", "desc")
            .append_pair("limit", &page_size.to_string())
            .append_pair("join", "transactions");
        Ok(url)
    }

    /// Fetch one page with retry on transient errors.
    ///
    /// Returns `None` when the account does not exist.
    async fn fetch_page_with_retry(&self, url: &Url) -> Result<Option<OperationsPage>> {
        let policy = ExponentialBackoff {
            initial_interval: self.retry_base_delay,
            max_interval: self.retry_base_delay * 4,
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        retry(policy, || async move {
            match self.fetch_page(url).await {
                Ok(page) => Ok(page),
                Err(e) if e.is_retryable() => {
                    warn!("Retryable Horizon error: {}", e);
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    /// Fetch one page (single attempt)
    async fn fetch_page(&self, url: &Url) -> Result<Option<OperationsPage>> {
        debug!(url = %url, "Fetching Horizon operations page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::LedgerTimeout(self.timeout.as_millis() as u64)
                } else {
                    Error::Ledger(format!("Horizon request failed: {}", e))
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LedgerStatus { status, body });
        }

        let page: OperationsPage = response
            .json()
            .await
            .map_err(|e| Error::Deserialization(format!("Failed to parse Horizon page: {}", e)))?;

        Ok(Some(page))
    }
}

#[async_trait]
impl LedgerSource for HorizonClient {
    fn name(&self) -> &'static str {
        "horizon"
    }

    async fn fetch_operations(
        &self,
        address: &str,
        window: &LookbackWindow,
        max_records: u32,
    ) -> Result<Vec<serde_json::Value>> {
        let max_records = max_records.min(MAX_RECORDS) as usize;
        if max_records == 0 {
            return Ok(Vec::new());
        }

        let mut url = self.operations_url(address, max_records as u32)?;
        let mut records = Vec::new();

        loop {
            let Some(page) = self.fetch_page_with_retry(&url).await? else {
                debug!(address = %address, "Account not found on Horizon");
                return Ok(Vec::new());
            };

            let page_records = page.embedded.records;
            if page_records.is_empty() {
                break;
            }

            let reached_window_start = page_records
                .last()
                .and_then(record_timestamp)
                .map(|oldest| oldest < window.start)
                .unwrap_or(false);

            let remaining = max_records - records.len();
            records.extend(page_records.into_iter().take(remaining));

            if records.len() >= max_records || reached_window_start {
                break;
            }

            match page.links.and_then(|l| l.next) {
                Some(next) => {
                    let next = Url::parse(&next.href)?;
                    if next == url {
                        break;
                    }
                    url = next;
                }
                None => break,
            }
        }

        debug!(address = %address, records = records.len(), "Fetched Horizon operations");
        Ok(records)
    }
}

fn record_timestamp(record: &serde_json::Value) -> Option<DateTime<Utc>> {
    record
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

// ============ Horizon API Response Types ============

#[derive(Debug, Deserialize)]
struct OperationsPage {
    #[serde(rename = "_links")]
    links: Option<PageLinks>,
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    records: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Network;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "GCKFBEIYTKP33XJZJ5XPT2YDMX3QZYLZSYX6ON6BPUZN5XGMB36HPQLM";

    fn client_for(server: &MockServer) -> HorizonClient {
        let config = HorizonConfig {
            base_url: Some(server.uri()),
            retry_base_delay_ms: 1,
            retry_max_elapsed_ms: 50,
            ..Default::default()
        };
        HorizonClient::from_config(&config).unwrap()
    }

    fn window() -> LookbackWindow {
        LookbackWindow::ending_at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), 90).unwrap()
    }

    fn record(id: u32, created_at: DateTime<Utc>) -> serde_json::Value {
        json!({
            "id": id.to_string(),
            "type": "payment",
            "created_at": created_at.to_rfc3339(),
            "from": ADDRESS,
            "to": "GOTHER",
            "amount": "10.0",
            "asset_type": "native"
        })
    }

    fn page(records: Vec<serde_json::Value>, next: Option<String>) -> serde_json::Value {
        let mut links = json!({});
        if let Some(href) = next {
            links["next"] = json!({ "href": href });
        }
        json!({ "_links": links, "_embedded": { "records": records } })
    }

    #[test]
    fn test_default_network_url() {
        let client = HorizonClient::from_config(&HorizonConfig {
            network: Network::Mainnet,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://horizon.stellar.org/");
    }

    #[test]
    fn test_operations_url() {
        let client = HorizonClient::from_config(&HorizonConfig::default()).unwrap();
        let url = client.operations_url(ADDRESS, 200).unwrap();

        assert_eq!(
            url.as_str(),
            format!(
                "https://horizon-testnet.stellar.org/accounts/{}/operations?order=desc&limit=200&join=transactions",
                ADDRESS
            )
        );
    }

    #[tokio::test]
    async fn test_missing_account_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/operations", ADDRESS)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "status": 404 })))
            .mount(&server)
            .await;

        let records = client_for(&server)
            .fetch_operations(ADDRESS, &window(), 200)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_follows_next_link_until_empty_page() {
        let server = MockServer::start().await;
        let recent = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
        let next = format!("{}/accounts/{}/operations?cursor=2&order=desc", server.uri(), ADDRESS);
        let last = format!("{}/accounts/{}/operations?cursor=4&order=desc", server.uri(), ADDRESS);

        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/operations", ADDRESS)))
            .and(query_param("cursor", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![], None)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/operations", ADDRESS)))
            .and(query_param("cursor", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![record(3, recent), record(4, recent)],
                Some(last),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/operations", ADDRESS)))
            .and(query_param("join", "transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![record(1, recent), record(2, recent)],
                Some(next),
            )))
            .mount(&server)
            .await;

        let records = client_for(&server)
            .fetch_operations(ADDRESS, &window(), 200)
            .await
            .unwrap();

        let ids: Vec<_> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_stops_at_window_start() {
        let server = MockServer::start().await;
        let recent = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
        let stale = window().start - ChronoDuration::days(3);
        let next = format!("{}/accounts/{}/operations?cursor=2&order=desc", server.uri(), ADDRESS);

        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/operations", ADDRESS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![record(1, recent), record(2, stale)],
                Some(next),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server)
            .fetch_operations(ADDRESS, &window(), 200)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_record_cap() {
        let server = MockServer::start().await;
        let recent = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
        let records: Vec<_> = (0..10).map(|i| record(i, recent)).collect();

        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/operations", ADDRESS)))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(records, None)))
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .fetch_operations(ADDRESS, &window(), 3)
            .await
            .unwrap();
        assert_eq!(fetched.len(), 3);
    }

    #[tokio::test]
    async fn test_server_error_is_returned_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .fetch_operations(ADDRESS, &window(), 200)
            .await;

        assert!(matches!(
            result,
            Err(Error::LedgerStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_configured_timeout_applies_to_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![], None))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = HorizonConfig {
            base_url: Some(server.uri()),
            timeout_ms: 50,
            retry_base_delay_ms: 1,
            retry_max_elapsed_ms: 10,
            ..Default::default()
        };
        let result = HorizonClient::from_config(&config)
            .unwrap()
            .fetch_operations(ADDRESS, &window(), 200)
            .await;

        assert!(matches!(result, Err(Error::LedgerTimeout(50))));
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid cursor"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .fetch_operations(ADDRESS, &window(), 200)
            .await;

        assert!(matches!(result, Err(Error::LedgerStatus { status: 400, .. })));
    }
}
