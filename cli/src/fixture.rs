//! Fixture-backed client for running the demo without network access.

use async_trait::async_trait;
use cambio_common::CurrencyPair;
use cambio_engine::{EngineError, EngineResult, RatesClient};
use std::collections::HashMap;

fn pair(source: &str, destination: &str) -> CurrencyPair {
    fn name(code: &str) -> &str {
        match code {
            "SGD" => "Singapore Dollar",
            "INR" => "Indian Rupee",
            "USD" => "US Dollar",
            "EUR" => "Euro",
            "GBP" => "British Pound",
            other => other,
        }
    }
    CurrencyPair::new(source, name(source), destination, name(destination))
}

/// Client serving a fixed catalog and rate table.
pub struct FixtureRatesClient {
    rates: HashMap<String, f64>,
}

impl FixtureRatesClient {
    pub fn new() -> Self {
        let rates = [
            ("SGD-INR", 64.92),
            ("SGD-USD", 0.74),
            ("SGD-EUR", 0.68),
            ("USD-INR", 87.10),
            ("USD-EUR", 0.92),
            ("USD-GBP", 0.79),
            ("USD-SGD", 1.35),
            ("EUR-USD", 1.09),
            ("EUR-INR", 94.80),
            ("GBP-USD", 1.27),
            ("INR-SGD", 0.0154),
        ]
        .into_iter()
        .map(|(key, rate)| (key.to_string(), rate))
        .collect();
        Self { rates }
    }
}

#[async_trait]
impl RatesClient for FixtureRatesClient {
    async fn fetch_pairs(&self) -> EngineResult<Vec<CurrencyPair>> {
        Ok(vec![
            pair("SGD", "INR"),
            pair("SGD", "USD"),
            pair("SGD", "EUR"),
            pair("USD", "INR"),
            pair("USD", "EUR"),
            pair("USD", "GBP"),
            pair("USD", "SGD"),
            pair("EUR", "USD"),
            pair("EUR", "INR"),
            pair("GBP", "USD"),
            pair("INR", "SGD"),
        ])
    }

    async fn fetch_rate(&self, source: &str, destination: &str) -> EngineResult<f64> {
        self.rates
            .get(&format!("{source}-{destination}"))
            .copied()
            .ok_or_else(|| EngineError::RateMissing {
                source: source.to_string(),
                destination: destination.to_string(),
            })
    }
}
