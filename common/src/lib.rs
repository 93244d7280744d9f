//! Cambio Common Types
//!
//! Shared types used across the Cambio conversion engine: currencies,
//! currency pairs, exchange rates, time utilities and presentation-time
//! formatting.

pub mod currency;
pub mod format;
pub mod time;

pub use currency::*;
pub use time::*;
