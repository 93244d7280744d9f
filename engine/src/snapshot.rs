//! Persisted state layout.
//!
//! The engine defines what must survive a restart; where and how the
//! snapshot is stored is the caller's concern.

use cambio_common::Currency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cache::CacheEntry;
use crate::history::HistoryEntry;

/// Key-value snapshot of the engine state that survives a restart.
///
/// The pair catalog itself is re-fetched at launch; rehydrated selections
/// that are no longer legal are repaired by the next `load_pairs` using the
/// normal fallback rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub selected_source: Option<Currency>,
    pub selected_destination: Option<Currency>,
    pub cached_rates: BTreeMap<String, CacheEntry>,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambio_common::time::now;
    use uuid::Uuid;

    #[test]
    fn test_json_round_trip() {
        let snapshot = Snapshot {
            selected_source: Some(Currency::new("SGD", "Singapore Dollar")),
            selected_destination: Some(Currency::new("INR", "Indian Rupee")),
            cached_rates: [("SGD-INR".to_string(), CacheEntry::new(61.2, now()))]
                .into_iter()
                .collect(),
            history: vec![HistoryEntry {
                id: Uuid::now_v7(),
                source_code: "SGD".to_string(),
                destination_code: "INR".to_string(),
                amount: 100.0,
                result: 6120.0,
                rate: 61.2,
                timestamp: now(),
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
