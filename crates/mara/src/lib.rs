#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/mara-rs/mara/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assembler;
pub mod config;
pub mod dedup;
pub mod error;
pub mod period;
pub mod pipeline;
pub mod record;
pub mod selection;
pub mod transform;

// Re-export sub-crates
pub use mara_data as data;
pub use mara_indicators as indicators;
pub use mara_output as output;

pub use assembler::{OutputTable, build_output_tables, sort_tables};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use mara_indicators::{IndicatorPlugin, IndicatorRegistry, load_plugins};
pub use period::{DateRange, Season};
pub use pipeline::{FetchOptions, Frequency, IndicatorFetcher, IndicatorResult};
pub use selection::{SecuritySelection, select_securities};
pub use transform::AggregateMethod;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
