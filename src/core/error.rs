//! Domain errors surfaced to callers of the rate and conversion APIs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    /// Network or parse failure with no cached copy to fall back on.
    #[error("Failed to fetch rates for {key} and no cached copy exists")]
    FetchFailure {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The requested target code is absent from the rate table.
    #[error("No rate available for {code}")]
    RateUnavailable { code: String },

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}
