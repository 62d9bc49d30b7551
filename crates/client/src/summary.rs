// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::update::synthetic_records;
use crate::{ClientError, Result};
use async_trait::async_trait;
use heagg_config::ValidUrl;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const SUMMARY_TIMEOUT: Duration = Duration::from_secs(10);

/// One country of the summary feed. `x` is the confirmed count, `y` the death count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRecord {
    pub x: f64,
    pub y: f64,
}

impl SummaryRecord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where a contributor gets the data its update is derived from
#[async_trait]
pub trait SummarySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<SummaryRecord>>;
}

#[derive(Deserialize)]
struct SummaryBody {
    #[serde(rename = "Countries", default)]
    countries: Option<Vec<CountryEntry>>,
}

#[derive(Deserialize)]
struct CountryEntry {
    #[serde(rename = "TotalConfirmed", default)]
    total_confirmed: Option<f64>,
    #[serde(rename = "TotalDeaths", default)]
    total_deaths: Option<f64>,
}

/// Turn a summary body into records. Null or missing counts are 0.
pub fn parse_summary(body: &[u8]) -> Result<Vec<SummaryRecord>> {
    let body: SummaryBody = serde_json::from_slice(body)
        .map_err(|e| ClientError::InvalidResponse(format!("summary data: {e}")))?;
    Ok(body
        .countries
        .unwrap_or_default()
        .into_iter()
        .map(|c| SummaryRecord::new(c.total_confirmed.unwrap_or(0.0), c.total_deaths.unwrap_or(0.0)))
        .collect())
}

/// Fetches the public summary feed
#[derive(Debug, Clone)]
pub struct HttpSummarySource {
    client: Client,
    url: ValidUrl,
}

impl HttpSummarySource {
    pub fn new(url: ValidUrl) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl SummarySource for HttpSummarySource {
    async fn fetch(&self) -> Result<Vec<SummaryRecord>> {
        info!(url = %self.url, "Fetching summary data");
        let response = self
            .client
            .get(self.url.as_url().clone())
            .timeout(SUMMARY_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let records = parse_summary(&response.bytes().await?)?;
        debug!(records = records.len(), "Parsed summary data");
        Ok(records)
    }
}

/// Offline source yielding the synthetic dataset
#[derive(Debug, Clone, Default)]
pub struct SyntheticSummarySource {
    seed: Option<u64>,
}

impl SyntheticSummarySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible noise
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

#[async_trait]
impl SummarySource for SyntheticSummarySource {
    async fn fetch(&self) -> Result<Vec<SummaryRecord>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(synthetic_records(&mut rng))
    }
}
