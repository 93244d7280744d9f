//! Amount entry and live-computed conversion result.

use cambio_common::ExchangeRate;

/// Conversion state owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct ConversionState {
    /// Raw amount text exactly as entered. Validation is a presentation
    /// concern; the engine never rejects malformed text.
    pub amount: String,
    /// The most recently resolved rate, kept across failed refetches.
    pub exchange_rate: Option<ExchangeRate>,
    /// Live-computed result, `None` while the input or rate is unusable.
    pub converted_amount: Option<f64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ConversionState {
    /// Create conversion state with an initial raw amount.
    pub fn new(initial_amount: impl Into<String>) -> Self {
        Self {
            amount: initial_amount.into(),
            ..Self::default()
        }
    }

    /// Store the raw text verbatim and recompute the result.
    pub fn set_amount(&mut self, raw: &str) {
        self.amount = raw.to_string();
        self.recompute();
    }

    /// Install a newly resolved rate and recompute the result.
    pub fn apply_rate(&mut self, rate: ExchangeRate) {
        self.exchange_rate = Some(rate);
        self.loading = false;
        self.recompute();
    }

    /// Clear the error without altering any other field.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // Both triggers (amount change, rate arrival) go through this single
    // formula so the two paths cannot diverge.
    fn recompute(&mut self) {
        self.converted_amount = compute_converted(&self.amount, self.exchange_rate.as_ref());
    }
}

/// Compute the converted amount from raw input text and the current rate.
///
/// `None` when the text does not parse as a finite positive number or no
/// rate is set; otherwise `amount * rate`. The stored result is never
/// rounded; rounding happens at presentation time.
pub fn compute_converted(raw_amount: &str, rate: Option<&ExchangeRate>) -> Option<f64> {
    let rate = rate?;
    let amount: f64 = raw_amount.trim().parse().ok()?;
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    Some(rate.convert(amount))
}
