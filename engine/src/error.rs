//! Engine error types.

/// Errors surfaced by the conversion engine.
///
/// Malformed amount text is not an error: it silently yields a `None`
/// converted amount. No error is fatal; failures leave prior valid state
/// intact.
#[derive(Debug)]
pub enum EngineError {
    /// Catalog endpoint failed or returned an unusable payload.
    CatalogFetch(String),

    /// Rate endpoint failed or returned an unusable payload.
    RateFetch(String),

    /// The rate endpoint answered but did not quote the requested destination.
    RateMissing { source: String, destination: String },

    /// The device is offline and no fresh cached rate is available.
    Offline,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::CatalogFetch(msg) => {
                write!(f, "Failed to fetch currency pairs: {msg}")
            }
            EngineError::RateFetch(msg) => {
                write!(f, "Failed to fetch exchange rate: {msg}")
            }
            EngineError::RateMissing {
                source,
                destination,
            } => write!(f, "No rate quoted for {source}-{destination}"),
            EngineError::Offline => write!(f, "Device is offline"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
