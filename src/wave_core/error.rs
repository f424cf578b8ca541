//! Error kinds raised by the wave core and its data provider

use thiserror::Error;

/// Market data could not be obtained (DataUnavailable).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("Unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),
    #[error("Malformed provider data: {0}")]
    Parse(String),
    #[error("Provider returned no data for {0}")]
    Empty(String),
}

/// Degenerate numeric input inside signal computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComputationError {
    #[error("division by zero in risk/reward: current price equals stop")]
    DivisionByZero,
}
