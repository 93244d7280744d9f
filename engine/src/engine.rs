//! The conversion engine: owns all state and orchestrates rate resolution.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cambio_common::time::now;
use cambio_common::ExchangeRate;
use parking_lot::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::cache::RateCache;
use crate::catalog::CatalogState;
use crate::client::RatesClient;
use crate::config::EngineConfig;
use crate::conversion::ConversionState;
use crate::error::{EngineError, EngineResult};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::snapshot::Snapshot;

/// The conversion state engine.
///
/// Owns the catalog, rate cache, conversion state and history ledger.
/// Collaborators read state as clones through the selector methods and
/// mutate only through the operations defined here; every operation is
/// atomic from a reader's perspective.
pub struct ConverterEngine {
    client: Arc<dyn RatesClient>,
    config: EngineConfig,
    cache: RateCache,
    catalog: RwLock<CatalogState>,
    conversion: RwLock<ConversionState>,
    history: HistoryLedger,
    online: AtomicBool,
    // Sequence of issued rate fetches; responses from superseded requests
    // are discarded instead of overwriting newer state.
    fetch_seq: AtomicU64,
}

impl ConverterEngine {
    /// Create an engine with empty state.
    pub fn new(client: Arc<dyn RatesClient>, config: EngineConfig) -> Self {
        Self::with_snapshot(client, config, None)
    }

    /// Create an engine, rehydrating persisted selections, cached rates and
    /// history when a snapshot is provided.
    ///
    /// Rehydrated selections are taken as-is; the next `load_pairs` repairs
    /// any that are no longer legal.
    pub fn with_snapshot(
        client: Arc<dyn RatesClient>,
        config: EngineConfig,
        snapshot: Option<Snapshot>,
    ) -> Self {
        let cache = RateCache::new(config.rate_ttl);
        let history = HistoryLedger::new();
        let mut catalog = CatalogState::default();

        if let Some(snapshot) = snapshot {
            catalog.selected_source = snapshot.selected_source;
            catalog.selected_destination = snapshot.selected_destination;
            cache.restore(snapshot.cached_rates);
            history.restore(snapshot.history);
        }

        let conversion = ConversionState::new(config.initial_amount.clone());

        Self {
            client,
            config,
            cache,
            catalog: RwLock::new(catalog),
            conversion: RwLock::new(conversion),
            history,
            online: AtomicBool::new(true),
            fetch_seq: AtomicU64::new(0),
        }
    }

    // --- currency catalog --------------------------------------------------

    /// Fetch the pair catalog and rederive the source and destination sets.
    ///
    /// On failure the error message is surfaced on the catalog sub-state and
    /// the previous pairs and derived sets stay untouched.
    #[instrument(skip(self))]
    pub async fn load_pairs(&self) -> EngineResult<()> {
        {
            let mut catalog = self.catalog.write();
            catalog.loading = true;
            catalog.error = None;
        }

        let result = match timeout(self.config.fetch_timeout, self.client.fetch_pairs()).await {
            Ok(inner) => inner,
            Err(_) => Err(EngineError::CatalogFetch(format!(
                "request timed out after {:?}",
                self.config.fetch_timeout
            ))),
        };

        let mut catalog = self.catalog.write();
        catalog.loading = false;
        match result {
            Ok(pairs) => {
                info!(pairs = pairs.len(), "Loaded currency catalog");
                catalog.apply_pairs(
                    pairs,
                    &self.config.preferred_source,
                    &self.config.preferred_destination,
                    now(),
                );
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Catalog fetch failed");
                catalog.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Select a source currency by code.
    pub fn select_source(&self, code: &str) {
        self.catalog.write().select_source(code);
    }

    /// Select a destination currency by code.
    pub fn select_destination(&self, code: &str) {
        self.catalog.write().select_destination(code);
    }

    /// Exchange the selected source and destination currencies.
    pub fn swap(&self) {
        self.catalog.write().swap();
    }

    /// Clear the catalog error without altering any other field.
    pub fn clear_catalog_error(&self) {
        self.catalog.write().clear_error();
    }

    // --- rate resolution ---------------------------------------------------

    /// Resolve the rate for the currently selected pair.
    ///
    /// No-op when either selection is missing. A fresh cache entry resolves
    /// synchronously without a network call; otherwise the rate is fetched,
    /// cached and applied. A failed fetch surfaces its message on the
    /// conversion sub-state and leaves the previous rate visible and usable.
    #[instrument(skip(self))]
    pub async fn resolve_rate(&self) -> EngineResult<()> {
        let Some((source, destination)) = self.selected_pair() else {
            debug!("No pair selected; nothing to resolve");
            return Ok(());
        };
        self.resolve_rate_for(&source, &destination).await
    }

    async fn resolve_rate_for(&self, source: &str, destination: &str) -> EngineResult<()> {
        if let Some(rate) = self.cache.fresh_rate(source, destination, now()) {
            debug!(source, destination, rate, "Using cached rate");
            let rate = ExchangeRate::new(source, destination, rate, now());
            let mut conversion = self.conversion.write();
            conversion.error = None;
            conversion.apply_rate(rate);
            return Ok(());
        }

        if !self.is_online() {
            let err = EngineError::Offline;
            let mut conversion = self.conversion.write();
            conversion.loading = false;
            conversion.error = Some(err.to_string());
            return Err(err);
        }

        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut conversion = self.conversion.write();
            conversion.loading = true;
            conversion.error = None;
        }

        let result = match timeout(
            self.config.fetch_timeout,
            self.client.fetch_rate(source, destination),
        )
        .await
        {
            Ok(inner) => inner,
            Err(_) => Err(EngineError::RateFetch(format!(
                "request timed out after {:?}",
                self.config.fetch_timeout
            ))),
        };

        match result {
            Ok(rate) => {
                // Cache keyed by pair is always safe to update, even when
                // the response no longer matches the selection.
                self.cache.put(source, destination, rate, now());

                if self.superseded(seq) {
                    // A newer fetch owns the loading flag now.
                    debug!(source, destination, "Discarding superseded response");
                    return Ok(());
                }
                if !self.pair_still_selected(source, destination) {
                    debug!(source, destination, "Discarding response for stale pair selection");
                    self.conversion.write().loading = false;
                    return Ok(());
                }

                info!(source, destination, rate, "Resolved exchange rate");
                let rate = ExchangeRate::new(source, destination, rate, now());
                self.conversion.write().apply_rate(rate);
                Ok(())
            }
            Err(err) => {
                if self.superseded(seq) {
                    debug!(source, destination, "Discarding failure of superseded fetch");
                    return Ok(());
                }

                warn!(source, destination, error = %err, "Rate fetch failed");
                let mut conversion = self.conversion.write();
                conversion.loading = false;
                conversion.error = Some(err.to_string());
                // The previous rate, if any, stays usable.
                Err(err)
            }
        }
    }

    fn superseded(&self, seq: u64) -> bool {
        self.fetch_seq.load(Ordering::SeqCst) != seq
    }

    fn selected_pair(&self) -> Option<(String, String)> {
        let catalog = self.catalog.read();
        Some((
            catalog.selected_source.as_ref()?.code.clone(),
            catalog.selected_destination.as_ref()?.code.clone(),
        ))
    }

    fn pair_still_selected(&self, source: &str, destination: &str) -> bool {
        self.selected_pair()
            .is_some_and(|(s, d)| s == source && d == destination)
    }

    // --- conversion --------------------------------------------------------

    /// Store the raw amount text verbatim and recompute the result.
    pub fn set_amount(&self, raw: &str) {
        self.conversion.write().set_amount(raw);
    }

    /// Clear the conversion error without altering any other field.
    pub fn clear_error(&self) {
        self.conversion.write().clear_error();
    }

    // --- history -----------------------------------------------------------

    /// Record a completed conversion in the ledger.
    ///
    /// The caller decides when a computation counts as completed; redundant
    /// calls with identical values append duplicate entries.
    pub fn record_conversion(
        &self,
        source_code: &str,
        destination_code: &str,
        amount: f64,
        result: f64,
        rate: f64,
    ) -> Option<HistoryEntry> {
        self.history
            .record(source_code, destination_code, amount, result, rate)
    }

    /// Empty the history ledger.
    pub fn clear_history(&self) {
        self.history.clear();
    }

    // --- connectivity ------------------------------------------------------

    /// Consume the external connectivity signal.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            info!(online, "Connectivity changed");
        }
    }

    /// Whether the external collaborator last reported the device online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    // --- selectors ---------------------------------------------------------

    /// Current catalog state.
    pub fn catalog(&self) -> CatalogState {
        self.catalog.read().clone()
    }

    /// Current conversion state.
    pub fn conversion(&self) -> ConversionState {
        self.conversion.read().clone()
    }

    /// Retained conversions, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    // --- persistence -------------------------------------------------------

    /// Snapshot of everything that must survive a restart.
    pub fn snapshot(&self) -> Snapshot {
        let catalog = self.catalog.read();
        Snapshot {
            selected_source: catalog.selected_source.clone(),
            selected_destination: catalog.selected_destination.clone(),
            cached_rates: self.cache.export(),
            history: self.history.entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockRatesClient;
    use cambio_common::CurrencyPair;

    fn pair(source: &str, destination: &str) -> CurrencyPair {
        CurrencyPair::new(source, source, destination, destination)
    }

    fn setup() -> (Arc<MockRatesClient>, ConverterEngine) {
        let client = Arc::new(MockRatesClient::new());
        client.set_pairs(vec![
            pair("SGD", "INR"),
            pair("SGD", "USD"),
            pair("USD", "EUR"),
            pair("USD", "GBP"),
        ]);
        client.set_rate("SGD", "INR", 61.2);
        client.set_rate("SGD", "USD", 0.74);
        client.set_rate("USD", "EUR", 0.92);

        let engine = ConverterEngine::new(client.clone(), EngineConfig::default());
        (client, engine)
    }

    #[tokio::test]
    async fn test_load_pairs_selects_defaults() {
        let (_, engine) = setup();
        engine.load_pairs().await.unwrap();

        let catalog = engine.catalog();
        assert_eq!(catalog.pairs.len(), 4);
        assert_eq!(catalog.selected_source.unwrap().code, "SGD");
        assert_eq!(catalog.selected_destination.unwrap().code, "INR");
        assert!(!catalog.loading);
        assert!(catalog.error.is_none());
        assert!(catalog.last_fetched.is_some());
    }

    #[tokio::test]
    async fn test_load_pairs_failure_keeps_prior_catalog() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();

        client.fail_pairs(true);
        let err = engine.load_pairs().await.unwrap_err();
        assert!(matches!(err, EngineError::CatalogFetch(_)));

        let catalog = engine.catalog();
        assert_eq!(catalog.pairs.len(), 4);
        assert_eq!(catalog.selected_source.unwrap().code, "SGD");
        assert_eq!(
            catalog.error.as_deref(),
            Some("Failed to fetch currency pairs: mock failure")
        );
        assert!(!catalog.loading);
    }

    #[tokio::test]
    async fn test_resolve_rate_fetches_and_computes() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();

        let conversion = engine.conversion();
        assert_eq!(conversion.exchange_rate.as_ref().unwrap().rate, 61.2);
        assert_eq!(conversion.converted_amount, Some(6120.0));
        assert!(!conversion.loading);
        assert_eq!(client.rate_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_rate_uses_fresh_cache_without_network() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();
        assert_eq!(client.rate_calls(), 1);

        // A second resolution within the TTL resolves from cache alone.
        engine.resolve_rate().await.unwrap();
        assert_eq!(client.rate_calls(), 1);
        assert_eq!(engine.conversion().converted_amount, Some(6120.0));
    }

    #[tokio::test]
    async fn test_resolve_rate_failure_keeps_previous_rate() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();

        client.fail_rates(true);
        engine.select_source("USD");
        let err = engine.resolve_rate().await.unwrap_err();
        assert!(matches!(err, EngineError::RateFetch(_)));

        let conversion = engine.conversion();
        // The stale-but-valid SGD-INR rate remains visible.
        assert_eq!(conversion.exchange_rate.as_ref().unwrap().rate, 61.2);
        assert!(conversion.error.is_some());
        assert!(!conversion.loading);
    }

    #[tokio::test]
    async fn test_set_amount_recomputes_against_current_rate() {
        let (_, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();

        engine.set_amount("50");
        assert_eq!(engine.conversion().converted_amount, Some(3060.0));

        engine.set_amount("abc");
        let conversion = engine.conversion();
        assert_eq!(conversion.amount, "abc");
        assert_eq!(conversion.converted_amount, None);
        // Malformed text is not surfaced as an error.
        assert!(conversion.error.is_none());
    }

    #[tokio::test]
    async fn test_swap_then_resolve() {
        let (client, engine) = setup();
        client.set_rate("INR", "SGD", 0.0163);
        client.set_pairs(vec![pair("SGD", "INR"), pair("INR", "SGD")]);

        engine.load_pairs().await.unwrap();
        engine.swap();

        let catalog = engine.catalog();
        assert_eq!(catalog.selected_source.unwrap().code, "INR");
        assert_eq!(catalog.selected_destination.unwrap().code, "SGD");

        engine.resolve_rate().await.unwrap();
        assert_eq!(engine.conversion().exchange_rate.unwrap().rate, 0.0163);
    }

    #[tokio::test]
    async fn test_offline_without_fresh_cache_fails_fast() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.set_online(false);

        let err = engine.resolve_rate().await.unwrap_err();
        assert!(matches!(err, EngineError::Offline));
        assert_eq!(client.rate_calls(), 0);
        assert!(engine.conversion().error.is_some());
    }

    #[tokio::test]
    async fn test_offline_with_fresh_cache_resolves() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();
        assert_eq!(client.rate_calls(), 1);

        engine.set_online(false);
        engine.resolve_rate().await.unwrap();
        assert_eq!(client.rate_calls(), 1);
        assert_eq!(engine.conversion().converted_amount, Some(6120.0));
    }

    #[tokio::test]
    async fn test_inflight_response_for_stale_selection_is_discarded() {
        let (client, engine) = setup();
        let engine = Arc::new(engine);
        engine.load_pairs().await.unwrap();

        client.set_rate_delay(std::time::Duration::from_millis(50));
        let resolving = tokio::spawn({
            let engine = engine.clone();
            async move { engine.resolve_rate().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // The user moves on to USD while SGD-INR is still in flight.
        engine.select_source("USD");
        resolving.await.unwrap().unwrap();

        let conversion = engine.conversion();
        assert!(conversion.exchange_rate.is_none());
        assert!(!conversion.loading);
        // The fetched rate still lands in the cache under its own pair.
        assert!(engine.snapshot().cached_rates.contains_key("SGD-INR"));
    }

    #[tokio::test]
    async fn test_last_write_wins_on_concurrent_resolutions() {
        let (client, engine) = setup();
        let engine = Arc::new(engine);
        engine.load_pairs().await.unwrap();

        client.set_rate_delay(std::time::Duration::from_millis(80));
        let slow = tokio::spawn({
            let engine = engine.clone();
            async move { engine.resolve_rate().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        engine.select_source("USD");
        client.set_rate_delay(std::time::Duration::ZERO);
        engine.resolve_rate().await.unwrap();
        slow.await.unwrap().unwrap();

        // The SGD-INR response arrives last but is superseded; USD-EUR stays.
        let rate = engine.conversion().exchange_rate.unwrap();
        assert_eq!(rate.source_code, "USD");
        assert_eq!(rate.rate, 0.92);
    }

    #[tokio::test]
    async fn test_record_and_clear_history() {
        let (_, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();

        let conversion = engine.conversion();
        let rate = conversion.exchange_rate.unwrap();
        let entry = engine
            .record_conversion(
                &rate.source_code,
                &rate.destination_code,
                100.0,
                conversion.converted_amount.unwrap(),
                rate.rate,
            )
            .unwrap();
        assert_eq!(entry.source_code, "SGD");
        assert_eq!(engine.history().len(), 1);

        engine.clear_history();
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_clear_error_only_clears_error() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();

        client.fail_rates(true);
        engine.select_source("USD");
        let _ = engine.resolve_rate().await;
        let before = engine.conversion();
        assert!(before.error.is_some());

        engine.clear_error();
        let after = engine.conversion();
        assert!(after.error.is_none());
        assert_eq!(after.amount, before.amount);
        assert_eq!(after.exchange_rate, before.exchange_rate);
        assert_eq!(after.converted_amount, before.converted_amount);
        assert_eq!(after.loading, before.loading);
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.resolve_rate().await.unwrap();
        engine.record_conversion("SGD", "INR", 100.0, 6120.0, 61.2).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.selected_source.as_ref().unwrap().code, "SGD");
        assert_eq!(snapshot.cached_rates.len(), 1);
        assert_eq!(snapshot.history.len(), 1);

        // Restart: cached rate and history are available immediately, and
        // the rate resolves without a network call.
        let restarted =
            ConverterEngine::with_snapshot(client.clone(), EngineConfig::default(), Some(snapshot));
        assert_eq!(restarted.history().len(), 1);

        let calls_before = client.rate_calls();
        restarted.resolve_rate().await.unwrap();
        assert_eq!(client.rate_calls(), calls_before);
        assert_eq!(restarted.conversion().converted_amount, Some(6120.0));
    }

    #[tokio::test]
    async fn test_load_pairs_repairs_rehydrated_selection() {
        let (client, engine) = setup();
        engine.load_pairs().await.unwrap();
        engine.select_source("USD");
        engine.select_destination("GBP");

        let snapshot = engine.snapshot();

        // The new catalog no longer offers USD as a source.
        client.set_pairs(vec![pair("SGD", "INR"), pair("SGD", "USD")]);
        let restarted =
            ConverterEngine::with_snapshot(client, EngineConfig::default(), Some(snapshot));
        restarted.load_pairs().await.unwrap();

        let catalog = restarted.catalog();
        assert_eq!(catalog.selected_source.unwrap().code, "SGD");
        assert_eq!(catalog.selected_destination.unwrap().code, "INR");
    }
}
