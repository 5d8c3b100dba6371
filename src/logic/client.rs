//! Client for the monitoring backend's REST API

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::model::{ServerDetails, ServerRecord};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    servers: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    data: ServerDetails,
}

/// One listing entry: a full inventory object, or a bare iDRAC address from
/// older backends. Anything else is skipped.
fn listing_entry(index: usize, entry: serde_json::Value) -> Option<ServerRecord> {
    match entry {
        serde_json::Value::String(ip) => Some(ServerRecord::from_ip(ip)),
        entry @ serde_json::Value::Object(_) => match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping server list entry {}: {}", index, e);
                None
            }
        },
        other => {
            tracing::warn!("Skipping server list entry {}: unexpected {}", index, other);
            None
        }
    }
}

/// Parses the body of `GET /servers`. Malformed entries are skipped, the
/// rest of the list is kept.
pub fn parse_listing(body: &str) -> Result<Vec<ServerRecord>> {
    let response: ListingResponse = serde_json::from_str(body)?;
    Ok(response
        .servers
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| listing_entry(index, entry))
        .collect())
}

/// Parses the body of `GET /servers/{ip}`.
pub fn parse_details(body: &str) -> Result<ServerDetails> {
    let response: DetailsResponse = serde_json::from_str(body)?;
    Ok(response.data)
}

/// Source of server inventory and telemetry
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn list_servers(&self) -> Result<Vec<ServerRecord>>;

    async fn server_details(&self, ip: &str) -> Result<ServerDetails>;
}

/// Production client using reqwest
pub struct ReqwestApiClient {
    client: reqwest::Client,
    config: Config,
}

impl std::fmt::Debug for ReqwestApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestApiClient")
            .field("api_url", &self.config.api_url)
            .finish()
    }
}

impl ReqwestApiClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DashboardError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DashboardError::Http(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} -> {}", url, status);
            return Err(DashboardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::Http(format!("Reading response body: {}", e)))?;
        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(body)
    }
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    async fn list_servers(&self) -> Result<Vec<ServerRecord>> {
        let body = self.get_text(&self.config.servers_url()).await?;
        parse_listing(&body)
    }

    async fn server_details(&self, ip: &str) -> Result<ServerDetails> {
        let url = self.config.server_url(ip)?;
        let body = self.get_text(url.as_str()).await?;
        parse_details(&body)
    }
}
