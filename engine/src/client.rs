//! Remote catalog and rate endpoints.

use async_trait::async_trait;
use cambio_common::CurrencyPair;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Client for the remote currency catalog and rate endpoints.
///
/// The engine owns the fetch-or-reuse-cache decision; implementations only
/// perform the raw fetches.
#[async_trait]
pub trait RatesClient: Send + Sync {
    /// Fetch the full list of supported conversion directions.
    async fn fetch_pairs(&self) -> EngineResult<Vec<CurrencyPair>>;

    /// Fetch the rate quoted for one unit of `source` in `destination`.
    async fn fetch_rate(&self, source: &str, destination: &str) -> EngineResult<f64>;
}

// Wire shape of the rate endpoint response.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Catalog endpoint returning the supported pair list.
    pub catalog_url: String,
    /// Rate endpoint; the source code is appended as a path segment.
    pub rates_url: String,
    /// Source currencies requested from the catalog endpoint.
    pub source_universe: Vec<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://www.instarem.com/api/v1/public/currency/pair".to_string(),
            rates_url: "https://open.er-api.com/v6/latest".to_string(),
            source_universe: ["USD", "HKD", "MYR", "SGD", "JPY", "EUR", "GBP", "AUD", "CAD"]
                .iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }
}

/// HTTP implementation backed by the public currency endpoints.
pub struct HttpRatesClient {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpRatesClient {
    /// Create a new HTTP client.
    pub fn new(config: HttpClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RatesClient for HttpRatesClient {
    async fn fetch_pairs(&self) -> EngineResult<Vec<CurrencyPair>> {
        let url = format!(
            "{}?source_currency={}",
            self.config.catalog_url,
            self.config.source_universe.join("-"),
        );
        debug!(%url, "Fetching currency pairs");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| EngineError::CatalogFetch(err.to_string()))?;

        response
            .json::<Vec<CurrencyPair>>()
            .await
            .map_err(|err| EngineError::CatalogFetch(err.to_string()))
    }

    async fn fetch_rate(&self, source: &str, destination: &str) -> EngineResult<f64> {
        let url = format!("{}/{}", self.config.rates_url, source);
        debug!(%url, destination, "Fetching exchange rate");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| EngineError::RateFetch(err.to_string()))?;

        let body = response
            .json::<RatesResponse>()
            .await
            .map_err(|err| EngineError::RateFetch(err.to_string()))?;

        body.rates
            .get(destination)
            .copied()
            .ok_or_else(|| EngineError::RateMissing {
                source: source.to_string(),
                destination: destination.to_string(),
            })
    }
}

/// Mock client for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRatesClient {
    pairs: parking_lot::RwLock<Vec<CurrencyPair>>,
    rates: dashmap::DashMap<String, f64>,
    fail_pairs: std::sync::atomic::AtomicBool,
    fail_rates: std::sync::atomic::AtomicBool,
    pair_calls: std::sync::atomic::AtomicUsize,
    rate_calls: std::sync::atomic::AtomicUsize,
    rate_delay_ms: std::sync::atomic::AtomicU64,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRatesClient {
    /// Create a mock with no pairs or rates.
    pub fn new() -> Self {
        Self {
            pairs: parking_lot::RwLock::new(Vec::new()),
            rates: dashmap::DashMap::new(),
            fail_pairs: std::sync::atomic::AtomicBool::new(false),
            fail_rates: std::sync::atomic::AtomicBool::new(false),
            pair_calls: std::sync::atomic::AtomicUsize::new(0),
            rate_calls: std::sync::atomic::AtomicUsize::new(0),
            rate_delay_ms: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Set the pair list returned by `fetch_pairs`.
    pub fn set_pairs(&self, pairs: Vec<CurrencyPair>) {
        *self.pairs.write() = pairs;
    }

    /// Set the rate returned for a pair.
    pub fn set_rate(&self, source: &str, destination: &str, rate: f64) {
        self.rates.insert(format!("{source}-{destination}"), rate);
    }

    /// Make `fetch_pairs` fail.
    pub fn fail_pairs(&self, fail: bool) {
        self.fail_pairs
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make `fetch_rate` fail.
    pub fn fail_rates(&self, fail: bool) {
        self.fail_rates
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Delay every `fetch_rate` response, simulating a slow network.
    pub fn set_rate_delay(&self, delay: std::time::Duration) {
        self.rate_delay_ms
            .store(delay.as_millis() as u64, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of `fetch_pairs` calls so far.
    pub fn pair_calls(&self) -> usize {
        self.pair_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of `fetch_rate` calls so far.
    pub fn rate_calls(&self) -> usize {
        self.rate_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockRatesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RatesClient for MockRatesClient {
    async fn fetch_pairs(&self) -> EngineResult<Vec<CurrencyPair>> {
        self.pair_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_pairs.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(EngineError::CatalogFetch("mock failure".to_string()));
        }
        Ok(self.pairs.read().clone())
    }

    async fn fetch_rate(&self, source: &str, destination: &str) -> EngineResult<f64> {
        self.rate_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let delay = self.rate_delay_ms.load(std::sync::atomic::Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.fail_rates.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(EngineError::RateFetch("mock failure".to_string()));
        }
        self.rates
            .get(&format!("{source}-{destination}"))
            .map(|rate| *rate)
            .ok_or_else(|| EngineError::RateMissing {
                source: source.to_string(),
                destination: destination.to_string(),
            })
    }
}
