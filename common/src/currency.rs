//! Currency and exchange-rate types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::Timestamp;

/// A currency as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 three-letter code.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

impl Currency {
    /// Create a new currency. The code is uppercased.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into().to_uppercase(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// One legal conversion direction supported by the remote catalog.
///
/// Field names mirror the catalog endpoint's wire format. The full pair
/// list defines which conversions the backend supports; it contains no
/// duplicate (source, destination) tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub source_currency_code: String,
    pub source_currency_name: String,
    pub destination_currency_code: String,
    pub destination_currency_name: String,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(
        source_code: impl Into<String>,
        source_name: impl Into<String>,
        destination_code: impl Into<String>,
        destination_name: impl Into<String>,
    ) -> Self {
        Self {
            source_currency_code: source_code.into(),
            source_currency_name: source_name.into(),
            destination_currency_code: destination_code.into(),
            destination_currency_name: destination_name.into(),
        }
    }

    /// The source side as a `Currency`.
    pub fn source(&self) -> Currency {
        Currency::new(&self.source_currency_code, &self.source_currency_name)
    }

    /// The destination side as a `Currency`.
    pub fn destination(&self) -> Currency {
        Currency::new(
            &self.destination_currency_code,
            &self.destination_currency_name,
        )
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.source_currency_code, self.destination_currency_code
        )
    }
}

/// A quoted exchange rate.
///
/// Immutable once created; a refetch produces a new instance, never an
/// in-place mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub source_code: String,
    pub destination_code: String,
    /// Units of destination currency per one unit of source currency.
    pub rate: f64,
    /// When this rate was fetched (or re-synthesized from cache).
    pub fetched_at: Timestamp,
}

impl ExchangeRate {
    /// Create a new exchange rate.
    pub fn new(
        source_code: impl Into<String>,
        destination_code: impl Into<String>,
        rate: f64,
        fetched_at: Timestamp,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            destination_code: destination_code.into(),
            rate,
            fetched_at,
        }
    }

    /// Convert a source amount using this rate.
    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} @ {}",
            self.source_code, self.destination_code, self.rate
        )
    }
}
