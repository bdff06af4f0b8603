//! File export of indicator tables.
//!
//! Each indicator result is written to its own file, `<name>.<ext>`, in a
//! target directory.

use crate::render::{RenderOptions, render_table};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format, one object per row.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// A named table bound for its own file.
#[derive(Debug, Clone)]
pub struct TableExport {
    /// File stem, usually the indicator name
    pub name: String,
    /// Table body
    pub data: DataFrame,
}

impl TableExport {
    /// Create a new table export.
    pub fn new(name: impl Into<String>, data: DataFrame) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// File name for `format`.
    pub fn file_name(&self, format: ExportFormat) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        format!("{}.{}", stem, format.extension())
    }

    fn to_json_rows(&self) -> Result<Vec<Value>, ExportError> {
        let names = self.data.get_column_names();
        let cells: Vec<Vec<Value>> = self
            .data
            .get_columns()
            .iter()
            .map(json_cells)
            .collect::<PolarsResult<_>>()?;

        Ok((0..self.data.height())
            .map(|row| {
                let object: Map<String, Value> = names
                    .iter()
                    .zip(&cells)
                    .map(|(name, column)| (name.to_string(), column[row].clone()))
                    .collect();
                Value::Object(object)
            })
            .collect())
    }
}

impl Exporter for TableExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => render_table(&self.data, RenderOptions::default()),
            ExportFormat::Json => Ok(serde_json::to_string(&self.to_json_rows()?)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&self.to_json_rows()?)?),
        }
    }
}

/// Write every table into `dir`, creating it if needed.
///
/// Returns the written paths in input order.
pub fn export_to_dir(
    dir: &Path,
    tables: &[TableExport],
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(table.file_name(format));
        table.export_to_file(&path, format)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "exported");
    Ok(written)
}

fn json_cells(column: &Column) -> PolarsResult<Vec<Value>> {
    let series = column.as_materialized_series();
    let dtype = series.dtype();
    if dtype.is_float() {
        Ok(series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| value.map_or(Value::Null, Value::from))
            .collect())
    } else if dtype.is_integer() {
        Ok(series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|value| value.map_or(Value::Null, Value::from))
            .collect())
    } else {
        Ok(series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|value| value.map_or(Value::Null, Value::from))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roe() -> TableExport {
        TableExport::new(
            "roe",
            df!(
                "ts_code" => ["600000.SH", "000001.SZ"],
                "name" => ["浦发银行", "平安银行"],
                "end_date" => ["20231231", "20231231"],
                "roe" => [Some(8.5), None]
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_table_export_csv() {
        let csv = roe().export_to_string(ExportFormat::Csv).unwrap();
        let expected = concat!(
            "ts_code,name,end_date,roe\n",
            "600000.SH,浦发银行,20231231,8.5\n",
            "000001.SZ,平安银行,20231231,\n",
        );
        assert_eq!(csv, expected);
        assert_eq!(
            csv,
            render_table(&roe().data, RenderOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_table_export_json() {
        let json = roe().export_to_string(ExportFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["ts_code"], "600000.SH");
        assert_eq!(parsed[0]["roe"], 8.5);
        assert!(parsed[1]["roe"].is_null());
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_table_export_pretty_json() {
        let json = roe().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(
            "pretty-json".parse::<ExportFormat>().unwrap(),
            ExportFormat::PrettyJson
        );
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let table = TableExport::new("a/b c", DataFrame::empty());
        assert_eq!(table.file_name(ExportFormat::Csv), "a_b_c.csv");
    }

    #[test]
    fn test_export_to_dir() {
        let dir = std::env::temp_dir().join(format!("mara-export-test-{}", std::process::id()));
        let written = export_to_dir(&dir, &[roe()], ExportFormat::Csv).unwrap();

        assert_eq!(written, vec![dir.join("roe.csv")]);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("ts_code,name,end_date,roe"));

        std::fs::remove_dir_all(dir).ok();
    }
}
