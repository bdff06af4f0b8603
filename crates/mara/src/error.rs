//! Error types for the indicator pipeline.

use crate::config::ConfigError;
use mara_data::DataError;
use mara_indicators::RegistryError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Query options are inconsistent
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Indicator is neither API-backed nor custom
    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    /// Aggregate statistic is not supported
    #[error("Unsupported aggregate method: {0} (expected mean or median)")]
    UnsupportedAggregate(String),

    /// A date string could not be parsed
    #[error("Invalid date {value:?}: {reason}")]
    InvalidDate {
        /// Input text
        value: String,
        /// What was expected
        reason: String,
    },

    /// End date precedes start date
    #[error("End date {end} is before start date {start}")]
    InvalidDateRange {
        /// Window start
        start: String,
        /// Window end
        end: String,
    },

    /// A custom indicator failed or returned the wrong shape
    #[error("Custom indicator {name} failed: {reason}")]
    CustomIndicator {
        /// Indicator name
        name: String,
        /// Failure description
        reason: String,
    },

    /// Registry construction error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Provider error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}
