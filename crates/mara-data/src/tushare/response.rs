//! Tushare response envelope and table decoding.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;

/// Top-level response returned by `api.tushare.pro`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    /// Zero on success
    pub code: i64,
    /// Human readable status
    #[serde(default)]
    pub msg: Option<String>,
    /// Result table, absent on failure
    #[serde(default)]
    pub data: Option<ResponseData>,
}

/// Column-oriented header plus row-oriented items.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseData {
    pub fields: Vec<String>,
    #[serde(default)]
    pub items: Vec<Vec<Value>>,
}

impl ApiResponse {
    /// Turn the envelope into a table, surfacing provider errors.
    pub(crate) fn into_frame(self, api: &str) -> Result<DataFrame> {
        if self.code != 0 {
            return Err(DataError::Api {
                api: api.to_string(),
                code: self.code,
                msg: self.msg.unwrap_or_default(),
            });
        }
        match self.data {
            Some(data) => decode_table(&data.fields, &data.items),
            None => Ok(DataFrame::empty()),
        }
    }
}

/// Decode `fields` / `items` into a DataFrame.
///
/// A column whose non-null cells are all JSON numbers becomes `Float64`;
/// anything else becomes `String`, with numbers rendered as text. Rows whose
/// width disagrees with the header are rejected.
pub fn decode_table(fields: &[String], items: &[Vec<Value>]) -> Result<DataFrame> {
    if fields.is_empty() {
        return Ok(DataFrame::empty());
    }

    if let Some((row, item)) = items
        .iter()
        .enumerate()
        .find(|(_, item)| item.len() != fields.len())
    {
        return Err(DataError::Decode(format!(
            "row {} has {} cells, expected {}",
            row,
            item.len(),
            fields.len()
        )));
    }

    let mut columns: Vec<Column> = Vec::with_capacity(fields.len());
    for (idx, name) in fields.iter().enumerate() {
        let cells = items.iter().map(|item| &item[idx]);
        let numeric = items
            .iter()
            .all(|item| matches!(item[idx], Value::Null | Value::Number(_)));

        let series = if numeric {
            let values: Vec<Option<f64>> = cells.map(Value::as_f64).collect();
            Series::new(name.as_str().into(), values)
        } else {
            let values: Vec<Option<String>> = cells.map(cell_to_string).collect();
            Series::new(name.as_str().into(), values)
        };
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

fn cell_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
