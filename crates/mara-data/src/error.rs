//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-zero status code
    #[error("Tushare API error on {api} (code {code}): {msg}")]
    Api {
        /// API that was queried
        api: String,
        /// Provider status code
        code: i64,
        /// Provider message
        msg: String,
    },

    /// Response could not be decoded into a table
    #[error("Response decoding error: {0}")]
    Decode(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Every attempt allowed by the retry policy failed
    #[error("{api} failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        /// API that was queried
        api: String,
        /// Number of attempts made
        attempts: u32,
        /// Error from the last attempt
        #[source]
        source: Box<DataError>,
    },
}

impl DataError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Decoding failures are deterministic for a given payload, so only
    /// transport and provider-side errors are retried.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }
}
