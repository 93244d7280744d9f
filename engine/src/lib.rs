//! Cambio Conversion Engine
//!
//! State engine for a currency converter: a collaborator selects a source
//! and destination currency, enters an amount, and reads a live-computed
//! converted amount. Recent conversions are retained as bounded history and
//! exchange rates are cached to tolerate intermittent connectivity.
//!
//! # Features
//!
//! - Currency-pair catalog with derived source/destination sets
//! - Rate caching with a fixed TTL and lazy staleness checks
//! - Live result recomputation on amount entry and rate arrival
//! - Bounded, most-recent-first conversion history
//! - Snapshot layout for state that must survive a restart
//!
//! # Example
//!
//! ```rust,ignore
//! use cambio_engine::{ConverterEngine, EngineConfig, HttpRatesClient, HttpClientConfig};
//! use std::sync::Arc;
//!
//! let client = Arc::new(HttpRatesClient::new(HttpClientConfig::default()));
//! let engine = ConverterEngine::new(client, EngineConfig::default());
//!
//! engine.load_pairs().await?;
//! engine.set_amount("100");
//! engine.resolve_rate().await?;
//! let result = engine.conversion().converted_amount;
//! ```

pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod history;
pub mod snapshot;

pub use cache::{CacheEntry, RateCache};
pub use catalog::CatalogState;
pub use client::{HttpClientConfig, HttpRatesClient, RatesClient};
pub use config::EngineConfig;
pub use conversion::ConversionState;
pub use engine::ConverterEngine;
pub use error::{EngineError, EngineResult};
pub use history::{HistoryEntry, HistoryLedger, HISTORY_CAPACITY};
pub use snapshot::Snapshot;

#[cfg(any(test, feature = "test-utils"))]
pub use client::MockRatesClient;
