#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/mara-rs/mara/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod render;

pub use export::{ExportError, ExportFormat, Exporter, TableExport, export_to_dir};
pub use render::{RenderOptions, Section, render_sections, render_table};
