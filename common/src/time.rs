//! Time utilities and protocol constants.

use chrono::{DateTime, Duration, Utc};

/// Engine timing constants.
pub mod constants {
    use super::Duration;

    /// How long a cached exchange rate may be reused before a refetch
    /// (5 minutes).
    pub fn rate_cache_ttl() -> Duration {
        Duration::milliseconds(300_000)
    }

    /// Upper bound on a single catalog or rate fetch (10 seconds).
    pub fn fetch_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp with timezone (always UTC for Cambio).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
