#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/mara-rs/mara/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod memory;
pub mod provider;
pub mod tushare;

pub use error::{DataError, Result};
pub use memory::MemoryProvider;
pub use provider::{DataProvider, QueryRequest};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
