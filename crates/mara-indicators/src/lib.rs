#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/mara-rs/mara/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod plugin;
pub mod registry;

pub use catalog::{API_ORDER, BASIC_FIELDS, IDENTITY_FIELDS, PRECEDENCE_FIELDS};
pub use plugin::{IndicatorPlugin, load_plugins};
pub use registry::{
    ApiSpec, CustomCompute, CustomIndicator, IndicatorRegistry, IndicatorSource, RegistryError,
};
