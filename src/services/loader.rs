//! Price series loading with stale-result suppression
//!
//! Every call to [`PriceSeriesLoader::load`] takes a new generation number.
//! When its fetch completes, the result is published into the single
//! "current series" slot only if no later load has started in the meantime;
//! otherwise it is discarded and reported as [`LoadOutcome::Superseded`].

use crate::error::{AppError, Result};
use crate::models::{normalize_prices, PriceHistory};
use crate::services::upstream::{HistoryRange, SearchQuote, UpstreamClient};
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Anything that can produce a close history for a ticker over a range
pub trait HistorySource {
    fn fetch_history(
        &self,
        ticker: &str,
        range: &HistoryRange,
    ) -> impl Future<Output = Result<PriceHistory>> + Send;
}

/// Anything that can answer a symbol search
pub trait SearchSource {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<SearchQuote>>> + Send;
}

impl HistorySource for UpstreamClient {
    async fn fetch_history(&self, ticker: &str, range: &HistoryRange) -> Result<PriceHistory> {
        Ok(self.fetch_history_range(ticker, range).await?)
    }
}

impl SearchSource for UpstreamClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchQuote>> {
        Ok(self.search_symbols(query).await?)
    }
}

/// Client for a running `sigmascope serve` proxy
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Invalid proxy url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(StdDuration::from_secs(crate::constants::UPSTREAM_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn api_url(&self, resource: &str, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("cannot be a base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", resource, segment]);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl HistorySource for ProxyClient {
    async fn fetch_history(&self, ticker: &str, range: &HistoryRange) -> Result<PriceHistory> {
        let mut url = self.api_url("history", ticker)?;
        url.query_pairs_mut()
            .append_pair("period1", &range.period1.to_string())
            .append_pair("period2", &range.period2.to_string())
            .append_pair("interval", &range.interval);
        let json = self.get_json(url).await?;
        let mut history: PriceHistory = serde_json::from_value(json)?;

        // The proxy already cleans its output; re-check the price invariant anyway
        let raw = history.prices.iter().map(|p| (p.date, Some(p.close))).collect();
        let (prices, dropped) = normalize_prices(raw);
        if dropped > 0 {
            warn!(ticker, dropped, "Proxy history contained invalid rows");
        }
        history.prices = prices;

        Ok(history)
    }
}

impl SearchSource for ProxyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchQuote>> {
        let url = self.api_url("search", query)?;
        let json = self.get_json(url).await?;
        Ok(serde_json::from_value(json)?)
    }
}

/// The series currently on screen
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub generation: u64,
    pub history: PriceHistory,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// This load is the latest and now occupies the current slot
    Current(Arc<LoadedSeries>),
    /// A later load started before this one finished; result discarded
    Superseded { ticker: String, generation: u64 },
}

/// A load that failed; the message names the ticker and nothing else
#[derive(Debug, Clone, thiserror::Error)]
#[error("Could not load data for {ticker}")]
pub struct LoadError {
    pub ticker: String,
    pub generation: u64,
}

pub struct PriceSeriesLoader<S> {
    source: S,
    generation: AtomicU64,
    current: RwLock<Option<Arc<LoadedSeries>>>,
}

impl<S: HistorySource> PriceSeriesLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            generation: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Fetch `ticker` over `range` and make it current unless a newer load
    /// overtook it
    ///
    /// A failed load leaves the previous series in place. No retry.
    pub async fn load(
        &self,
        ticker: &str,
        range: &HistoryRange,
    ) -> std::result::Result<LoadOutcome, LoadError> {
        let ticker = ticker.trim().to_uppercase();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticker = %ticker, generation, "Load started");

        let result = self.source.fetch_history(&ticker, range).await;

        // Hold the slot while checking so check-and-publish is one step
        let mut slot = self.current.write().await;
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            debug!(ticker = %ticker, generation, latest, "Discarding superseded load");
            return Ok(LoadOutcome::Superseded { ticker, generation });
        }

        match result {
            Ok(history) => {
                info!(ticker = %ticker, generation, points = history.prices.len(), "Load complete");
                let series = Arc::new(LoadedSeries {
                    generation,
                    history,
                    loaded_at: Utc::now(),
                });
                *slot = Some(series.clone());
                Ok(LoadOutcome::Current(series))
            }
            Err(e) => {
                warn!(ticker = %ticker, generation, error = %e, "Load failed");
                Err(LoadError { ticker, generation })
            }
        }
    }

    /// Snapshot of the current series
    pub async fn current(&self) -> Option<Arc<LoadedSeries>> {
        self.current.read().await.clone()
    }
}
