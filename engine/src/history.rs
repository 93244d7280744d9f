//! Bounded, most-recent-first log of completed conversions.

use cambio_common::time::{now, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Maximum number of conversions retained for user reference.
pub const HISTORY_CAPACITY: usize = 10;

/// A completed conversion. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Time-ordered unique id (UUID v7).
    pub id: Uuid,
    pub source_code: String,
    pub destination_code: String,
    pub amount: f64,
    pub result: f64,
    pub rate: f64,
    pub timestamp: Timestamp,
}

/// Bounded ledger of completed conversions, most recent first.
///
/// Redundant records with identical values append duplicate entries; the
/// ledger does not deduplicate.
#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed conversion at the front, discarding anything
    /// beyond capacity.
    ///
    /// Requires a positive amount, a finite result and a positive rate;
    /// otherwise nothing is recorded and `None` is returned.
    pub fn record(
        &self,
        source_code: &str,
        destination_code: &str,
        amount: f64,
        result: f64,
        rate: f64,
    ) -> Option<HistoryEntry> {
        if !(amount > 0.0) || !result.is_finite() || !(rate > 0.0) {
            debug!(source_code, destination_code, amount, result, "Skipping history record");
            return None;
        }

        let entry = HistoryEntry {
            id: Uuid::now_v7(),
            source_code: source_code.to_string(),
            destination_code: destination_code.to_string(),
            amount,
            result,
            rate,
            timestamp: now(),
        };

        let mut entries = self.entries.write();
        entries.insert(0, entry.clone());
        entries.truncate(HISTORY_CAPACITY);
        Some(entry)
    }

    /// Empty the ledger unconditionally.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// All retained conversions, most recent first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    /// Number of retained conversions.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Replace the ledger with entries rehydrated from a snapshot.
    pub fn restore(&self, mut entries: Vec<HistoryEntry>) {
        entries.truncate(HISTORY_CAPACITY);
        *self.entries.write() = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_record_prepends() {
        let ledger = HistoryLedger::new();
        ledger.record("USD", "EUR", 100.0, 92.0, 0.92).unwrap();
        ledger.record("SGD", "INR", 50.0, 3060.0, 61.2).unwrap();

        let entries = ledger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source_code, "SGD");
        assert_eq!(entries[1].source_code, "USD");
    }

    #[test]
    fn test_capacity_bound() {
        let ledger = HistoryLedger::new();
        for i in 1..=15 {
            ledger
                .record("USD", "EUR", i as f64, i as f64 * 0.92, 0.92)
                .unwrap();
        }

        let entries = ledger.entries();
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        // The 15th append sits at index 0; the oldest five are discarded.
        assert_eq!(entries[0].amount, 15.0);
        assert_eq!(entries[9].amount, 6.0);
    }

    #[test]
    fn test_preconditions() {
        let ledger = HistoryLedger::new();
        assert!(ledger.record("USD", "EUR", 0.0, 0.0, 0.92).is_none());
        assert!(ledger.record("USD", "EUR", -1.0, -0.92, 0.92).is_none());
        assert!(ledger.record("USD", "EUR", 100.0, f64::NAN, 0.92).is_none());
        assert!(ledger.record("USD", "EUR", 100.0, f64::INFINITY, 0.92).is_none());
        assert!(ledger.record("USD", "EUR", 100.0, 92.0, 0.0).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_duplicates_permitted() {
        let ledger = HistoryLedger::new();
        ledger.record("USD", "EUR", 100.0, 92.0, 0.92).unwrap();
        ledger.record("USD", "EUR", 100.0, 92.0, 0.92).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_ids_unique_across_rapid_appends() {
        let ledger = HistoryLedger::new();
        for _ in 0..HISTORY_CAPACITY {
            ledger.record("USD", "EUR", 100.0, 92.0, 0.92).unwrap();
        }
        let ids: HashSet<Uuid> = ledger.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_clear() {
        let ledger = HistoryLedger::new();
        ledger.record("USD", "EUR", 100.0, 92.0, 0.92).unwrap();
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_restore_respects_capacity() {
        let ledger = HistoryLedger::new();
        for i in 0..12 {
            ledger.record("USD", "EUR", (i + 1) as f64, 1.0, 1.0).unwrap();
        }
        let entries = ledger.entries();

        let restored = HistoryLedger::new();
        restored.restore(entries.clone());
        assert_eq!(restored.entries(), entries);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ledger_is_bounded_and_newest_first(
                amounts in proptest::collection::vec(0.01f64..1_000_000.0, 1..40)
            ) {
                let ledger = HistoryLedger::new();
                for amount in &amounts {
                    ledger.record("USD", "EUR", *amount, amount * 0.92, 0.92).unwrap();
                }

                let entries = ledger.entries();
                prop_assert!(entries.len() <= HISTORY_CAPACITY);
                prop_assert_eq!(entries.len(), amounts.len().min(HISTORY_CAPACITY));
                prop_assert_eq!(entries[0].amount, *amounts.last().unwrap());
            }
        }
    }
}
