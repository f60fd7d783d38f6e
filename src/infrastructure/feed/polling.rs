//! HTTP client for the polling quote API.
//!
//! The upstream answers `?query=SERVICE_ITEM:<code>` with a JSON body of
//! shape `{"result":{"areas":[{"datas":[{"nv": <price>}]}]}}`. No retry
//! middleware on purpose: a failed fetch is re-attempted only when the
//! quote's staleness window next expires.

use crate::domain::errors::FeedError;
use crate::domain::ports::PriceFeed;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PollingResponse {
    result: PollingResult,
}

#[derive(Debug, Deserialize)]
struct PollingResult {
    areas: Vec<PollingArea>,
}

#[derive(Debug, Deserialize)]
struct PollingArea {
    datas: Vec<PollingData>,
}

#[derive(Debug, Deserialize)]
struct PollingData {
    nv: Decimal,
}

pub struct PollingPriceFeed {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl PollingPriceFeed {
    /// Fails if the HTTP client cannot be built, rather than quietly
    /// running without the configured timeouts.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build polling feed HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

fn parse_price(body: &str) -> Result<Decimal, FeedError> {
    let payload: PollingResponse =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed {
            reason: e.to_string(),
        })?;

    let price = payload
        .result
        .areas
        .first()
        .and_then(|a| a.datas.first())
        .map(|d| d.nv)
        .ok_or_else(|| FeedError::Malformed {
            reason: "empty areas/datas in polling payload".to_string(),
        })?;

    if price <= Decimal::ZERO {
        return Err(FeedError::NonPositivePrice { price });
    }
    Ok(price)
}

#[async_trait]
impl PriceFeed for PollingPriceFeed {
    async fn fetch(&self, provider_symbol: &str) -> Result<Decimal, FeedError> {
        let url = format!("{}?query=SERVICE_ITEM:{}", self.base_url, provider_symbol);
        debug!(%url, "fetching upstream quote");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                FeedError::Unavailable {
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(FeedError::Unavailable {
                reason: format!("upstream status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| FeedError::Unavailable {
            reason: e.to_string(),
        })?;
        parse_price(&body)
    }
}
