//! Delimited text rendering.

use crate::export::ExportError;
use polars::prelude::*;
use std::io::Write;

/// How tables are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Field separator
    pub delimiter: u8,
    /// Write a header row
    pub header: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
        }
    }
}

/// A labelled table to print.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    /// Printed as `# frequency: <label>` when there are several sections
    pub label: &'a str,
    /// Table body
    pub data: &'a DataFrame,
}

/// Render one table. Nulls become empty cells.
pub fn render_table(data: &DataFrame, options: RenderOptions) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(vec![]);

    if options.header {
        wtr.write_record(data.get_column_names().iter().map(|name| name.as_str()))?;
    }
    let columns = text_columns(data)?;
    for row in 0..data.height() {
        wtr.write_record(
            columns
                .iter()
                .map(|column| column[row].as_deref().unwrap_or("")),
        )?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Write sections separated by blank lines.
///
/// A single section is written bare; with more than one, each is preceded by
/// its `# frequency:` label. Empty tables print as an empty line.
pub fn render_sections<W: Write>(
    out: &mut W,
    sections: &[Section<'_>],
    options: RenderOptions,
) -> Result<(), ExportError> {
    let labelled = sections.len() > 1;
    for (idx, section) in sections.iter().enumerate() {
        if labelled {
            writeln!(out, "# frequency: {}", section.label)?;
        }
        if section.data.height() == 0 {
            writeln!(out)?;
        } else {
            let text = render_table(section.data, options)?;
            writeln!(out, "{}", text.trim_end_matches(['\r', '\n']))?;
        }
        if idx + 1 < sections.len() {
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Every column as text cells.
fn text_columns(data: &DataFrame) -> PolarsResult<Vec<Vec<Option<String>>>> {
    data.get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            if series.dtype().is_float() {
                Ok(series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|value| value.map(|v| v.to_string()))
                    .collect())
            } else {
                Ok(series
                    .cast(&DataType::String)?
                    .str()?
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect())
            }
        })
        .collect()
}
