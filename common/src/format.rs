//! Presentation-time formatting.
//!
//! Stored amounts and rates are never rounded; rounding happens only when
//! a value is rendered.

use crate::time::Timestamp;

/// Format a converted amount for display with two decimal places.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Format an amount together with its currency code.
pub fn format_currency(amount: f64, code: &str) -> String {
    format!("{amount:.2} {code}")
}

/// Format an exchange rate for display with four decimal places.
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.4}")
}

/// Format a timestamp for display.
pub fn format_timestamp(timestamp: Timestamp) -> String {
    timestamp.format("%b %e, %Y %H:%M").to_string()
}
