//! Engine configuration.

use cambio_common::time::{constants, DurationExt};
use chrono::Duration;

/// Configuration for the conversion engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a cached rate may be reused before a refetch.
    pub rate_ttl: Duration,
    /// Upper bound on a single network fetch.
    pub fetch_timeout: std::time::Duration,
    /// Source selected when the catalog loads and nothing is chosen yet.
    pub preferred_source: String,
    /// Destination selected when the derived set allows it.
    pub preferred_destination: String,
    /// Raw amount shown before the user types anything.
    pub initial_amount: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_ttl: constants::rate_cache_ttl(),
            fetch_timeout: constants::fetch_timeout().as_std(),
            preferred_source: "SGD".to_string(),
            preferred_destination: "INR".to_string(),
            initial_amount: "100".to_string(),
        }
    }
}
