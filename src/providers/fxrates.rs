use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::core::config::API_KEY_ENV;
use crate::core::rates::{RateSource, RateTable};

/// Client for the fxratesapi `latest` endpoint.
pub struct FxRatesProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl FxRatesProvider {
    /// Without an API key every fetch fails, leaving callers with whatever
    /// is cached.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxconv/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FxRatesProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            client,
        })
    }

    fn latest_url(&self, base: Option<&str>) -> Result<Url> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No API key configured (set provider.api_key or {API_KEY_ENV})"))?;
        let endpoint = format!("{}/latest", self.base_url);
        let mut params = vec![("api_key", api_key)];
        if let Some(base) = base {
            params.push(("base", base));
        }
        Url::parse_with_params(&endpoint, &params)
            .with_context(|| format!("Invalid rate service URL: {endpoint}"))
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: BTreeMap<String, f64>,
}

#[async_trait]
impl RateSource for FxRatesProvider {
    #[instrument(name = "FxRatesFetch", skip(self))]
    async fn fetch_rates(&self, base: Option<&str>) -> Result<RateTable> {
        let url = self.latest_url(base)?;
        debug!("Requesting rates from {}/latest", self.base_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            // The request URL carries the API key.
            .map_err(|e| anyhow!("Request error: {} for base: {:?}", e.without_url(), base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base: {:?}",
                response.status(),
                base
            ));
        }

        let text = response
            .text()
            .await
            .context("Failed to read rate response")?;

        let data: LatestResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %text, "Failed to parse rate response");
                return Err(e).context("Failed to parse rate response");
            }
        };

        RateTable::new(data.rates)
            .with_context(|| format!("Rejected rate table for base: {base:?}"))
    }
}
