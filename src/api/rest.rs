use crate::config::ApiConfig;
use crate::error::{Result, SurfaceError};
use crate::models::RawContract;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Reference-data response envelope. Only `results` matters here; the
/// pagination cursor is ignored because one page of 1000 contracts covers
/// the expiry window this pipeline asks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsResponse {
    #[serde(default)]
    pub results: Vec<RawContract>,
    pub next_url: Option<String>,
}

/// HTTP client for the options reference-data endpoint.
pub struct ContractsClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ContractsClient {
    /// Build a client whose requests abort after the configured timeout
    /// instead of hanging on a stalled upstream.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SurfaceError::FetchError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Fetch option contracts for `symbol` expiring between `now` and
    /// `now + expiry_range_days`.
    ///
    /// An upstream error status or an empty result set is an error; the
    /// caller decides whether to keep a previously built surface.
    pub async fn fetch_contracts(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        expiry_range_days: u32,
    ) -> Result<Vec<RawContract>> {
        let from = now.date_naive();
        let to = (now + ChronoDuration::days(expiry_range_days as i64)).date_naive();
        let url = format!(
            "{}/v3/reference/options/contracts?underlying_ticker={}&expiration_date.gte={}&expiration_date.lte={}&limit=1000&apiKey={}",
            self.config.base_url, symbol, from, to, self.config.api_key
        );
        debug!(symbol, %from, %to, "fetching option contracts");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SurfaceError::FetchError(format!("Contracts request failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(SurfaceError::FetchError(format!(
                "Contracts request returned status {}",
                resp.status()
            )));
        }
        let body = resp.json::<ContractsResponse>().await.map_err(|e| {
            SurfaceError::ParseError(format!("Failed to parse contracts response: {}", e))
        })?;
        if body.results.is_empty() {
            return Err(SurfaceError::FetchError(format!(
                "No option contracts found for {}",
                symbol
            )));
        }
        info!(symbol, count = body.results.len(), "fetched option contracts");
        Ok(body.results)
    }
}
