//! Currency catalog: the set of legal conversion directions and the
//! currently selected source and destination.
//!
//! The source and destination lists are always rederived from `pairs`
//! after a mutation, never maintained as independent state.

use cambio_common::{Currency, CurrencyPair, Timestamp};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Catalog state owned by the engine.
///
/// Invariant: `selected_destination`, if set, is an element of
/// `destination_currencies`, which always equals the pairs filtered by
/// `selected_source`.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    /// Legal (source, destination) directions, in catalog order.
    pub pairs: Vec<CurrencyPair>,
    /// Distinct source currencies derived from `pairs`.
    pub source_currencies: Vec<Currency>,
    /// Destinations legal for the selected source, derived from `pairs`.
    pub destination_currencies: Vec<Currency>,
    pub selected_source: Option<Currency>,
    pub selected_destination: Option<Currency>,
    /// When the catalog was last fetched.
    pub last_fetched: Option<Timestamp>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Distinct source currencies in catalog order.
///
/// When the same code appears with different names across pairs, the
/// first-seen name wins. This mirrors a latent ambiguity in the backend
/// catalog rather than a deliberate reconciliation rule.
pub fn derive_sources(pairs: &[CurrencyPair]) -> Vec<Currency> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .filter(|pair| seen.insert(pair.source_currency_code.clone()))
        .map(CurrencyPair::source)
        .collect()
}

/// Destinations legal for `source_code`, in pair-list order.
pub fn derive_destinations(pairs: &[CurrencyPair], source_code: &str) -> Vec<Currency> {
    pairs
        .iter()
        .filter(|pair| pair.source_currency_code == source_code)
        .map(CurrencyPair::destination)
        .collect()
}

fn pick(list: &[Currency], preferred_code: &str) -> Option<Currency> {
    list.iter()
        .find(|currency| currency.code == preferred_code)
        .or_else(|| list.first())
        .cloned()
}

fn contains_code(list: &[Currency], code: &str) -> bool {
    list.iter().any(|currency| currency.code == code)
}

impl CatalogState {
    /// Apply a successfully fetched pair list.
    ///
    /// Rederives the source set, then the destination set for the resulting
    /// source. A selection that is still legal is kept; one that is missing
    /// or no longer legal falls back to the preferred code if present, else
    /// the first element in catalog order. The same rule repairs selections
    /// rehydrated from a persisted snapshot.
    pub fn apply_pairs(
        &mut self,
        pairs: Vec<CurrencyPair>,
        preferred_source: &str,
        preferred_destination: &str,
        fetched_at: Timestamp,
    ) {
        self.pairs = pairs;
        self.source_currencies = derive_sources(&self.pairs);
        self.last_fetched = Some(fetched_at);

        let source_legal = self
            .selected_source
            .as_ref()
            .is_some_and(|source| contains_code(&self.source_currencies, &source.code));
        if !source_legal {
            self.selected_source = pick(&self.source_currencies, preferred_source);
            debug!(source = ?self.selected_source, "Defaulted source selection");
        }

        self.rederive_destinations();
        let destination_legal = self
            .selected_destination
            .as_ref()
            .is_some_and(|dest| contains_code(&self.destination_currencies, &dest.code));
        if !destination_legal {
            self.selected_destination = pick(&self.destination_currencies, preferred_destination);
            debug!(destination = ?self.selected_destination, "Defaulted destination selection");
        }
    }

    /// Select a source currency by code.
    ///
    /// Rederives the destination set; a previously selected destination that
    /// is not in the new set falls back to the first available destination,
    /// or `None` if the set is empty. Codes outside the derived source list
    /// are ignored.
    pub fn select_source(&mut self, code: &str) {
        let Some(currency) = self
            .source_currencies
            .iter()
            .find(|currency| currency.code == code)
            .cloned()
        else {
            warn!(code, "Ignoring selection of unknown source currency");
            return;
        };
        self.selected_source = Some(currency);
        self.rederive_destinations();
        self.repair_destination();
    }

    /// Select a destination currency by code. Nothing else is recomputed.
    ///
    /// Codes outside the derived destination list are ignored.
    pub fn select_destination(&mut self, code: &str) {
        let Some(currency) = self
            .destination_currencies
            .iter()
            .find(|currency| currency.code == code)
            .cloned()
        else {
            warn!(code, "Ignoring selection of unknown destination currency");
            return;
        };
        self.selected_destination = Some(currency);
    }

    /// Exchange the selected source and destination.
    ///
    /// Only effective when both are currently selected. The destination set
    /// is rederived for the new source exactly as in `select_source`.
    pub fn swap(&mut self) {
        let (Some(source), Some(destination)) = (
            self.selected_source.clone(),
            self.selected_destination.clone(),
        ) else {
            return;
        };
        self.selected_source = Some(destination);
        self.selected_destination = Some(source);
        self.rederive_destinations();
        self.repair_destination();
    }

    /// Clear the catalog error without altering any other field.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn rederive_destinations(&mut self) {
        self.destination_currencies = match &self.selected_source {
            Some(source) => derive_destinations(&self.pairs, &source.code),
            None => Vec::new(),
        };
    }

    fn repair_destination(&mut self) {
        let legal = self
            .selected_destination
            .as_ref()
            .is_some_and(|dest| contains_code(&self.destination_currencies, &dest.code));
        if !legal {
            self.selected_destination = self.destination_currencies.first().cloned();
        }
    }
}
