//! Row-level view of provider tables.
//!
//! Reconciliation is decided row by row, so provider frames are unpacked into
//! [`Record`]s, processed, and packed back into a frame for output.

use crate::period::{parse_yyyymmdd, to_yyyymmdd};
use chrono::NaiveDate;
use polars::prelude::*;

/// One disclosure for one security and reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Security code
    pub ts_code: String,
    /// Reporting period end
    pub end_date: NaiveDate,
    /// Announcement date, `YYYYMMDD`
    pub ann_date: Option<String>,
    /// Final announcement date, `YYYYMMDD`
    pub f_ann_date: Option<String>,
    /// Statement variant code
    pub report_type: Option<String>,
    /// `"1"` when the provider confirmed an update
    pub update_flag: Option<String>,
    /// Indicator values, in the order the indicators were requested
    pub values: Vec<Option<f64>>,
}

impl Record {
    /// Output row keeping the reporting period.
    pub fn to_row(&self) -> Row {
        Row {
            ts_code: self.ts_code.clone(),
            ann_date: self.ann_date.clone(),
            end_date: Some(to_yyyymmdd(self.end_date)),
            values: self.values.clone(),
        }
    }

    /// Whether every indicator value is missing.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Output row. Period fields are absent after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Security code
    pub ts_code: String,
    /// Announcement date, `YYYYMMDD`
    pub ann_date: Option<String>,
    /// Reporting period end, `YYYYMMDD`
    pub end_date: Option<String>,
    /// Indicator values
    pub values: Vec<Option<f64>>,
}

/// Outcome of unpacking one provider frame.
#[derive(Debug, Default)]
pub struct Extracted {
    /// Rows with a valid reporting period
    pub records: Vec<Record>,
    /// Rows dropped for an unparsable period or missing security code
    pub malformed: usize,
}

/// Unpack a provider frame.
///
/// Returns `None` when the frame has no `end_date` column at all. A missing
/// `ts_code` column is filled with `fallback_code`, the code the frame was
/// requested for; without one the frame is unusable too. Indicator columns
/// the frame lacks read as missing values.
pub fn extract_records(
    df: &DataFrame,
    fallback_code: Option<&str>,
    indicators: &[String],
) -> PolarsResult<Option<Extracted>> {
    let Some(end_dates) = text_values(df, "end_date")? else {
        return Ok(None);
    };
    let codes = match (text_values(df, "ts_code")?, fallback_code) {
        (Some(codes), _) => codes,
        (None, Some(code)) => vec![Some(code.to_string()); df.height()],
        (None, None) => return Ok(None),
    };
    let ann_dates = optional_text(df, "ann_date")?;
    let f_ann_dates = optional_text(df, "f_ann_date")?;
    let report_types = optional_text(df, "report_type")?;
    let update_flags = optional_text(df, "update_flag")?;
    let columns = indicators
        .iter()
        .map(|name| numeric_values(df, name))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut extracted = Extracted::default();
    for idx in 0..df.height() {
        let period = end_dates[idx].as_deref().and_then(parse_yyyymmdd);
        let (Some(ts_code), Some(end_date)) = (codes[idx].clone(), period) else {
            extracted.malformed += 1;
            continue;
        };
        extracted.records.push(Record {
            ts_code,
            end_date,
            ann_date: ann_dates[idx].clone(),
            f_ann_date: f_ann_dates[idx].clone(),
            report_type: report_types[idx].clone(),
            update_flag: update_flags[idx].clone(),
            values: columns.iter().map(|column| column[idx]).collect(),
        });
    }
    Ok(Some(extracted))
}

/// Pack rows into `ts_code, ann_date, end_date, <indicators...>`.
pub fn rows_to_frame(rows: &[Row], indicators: &[String]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(indicators.len() + 3);
    columns.push(
        Series::new(
            "ts_code".into(),
            rows.iter().map(|row| row.ts_code.as_str()).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            "ann_date".into(),
            rows.iter().map(|row| row.ann_date.as_deref()).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            "end_date".into(),
            rows.iter().map(|row| row.end_date.as_deref()).collect::<Vec<_>>(),
        )
        .into(),
    );
    for (idx, name) in indicators.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|row| row.values[idx]).collect();
        columns.push(Series::new(name.as_str().into(), values).into());
    }
    DataFrame::new(columns)
}

/// A column as text, or `None` if the frame lacks it.
///
/// Whole numbers render without a fractional part so numeric codes such as
/// `report_type` and dates decoded as numbers compare as the provider wrote
/// them.
pub(crate) fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let series = column.as_materialized_series();
    let dtype = series.dtype();

    let values = if dtype.is_float() {
        series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| value.map(format_number))
            .collect()
    } else if dtype.is_integer() {
        series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|value| value.map(|v| v.to_string()))
            .collect()
    } else {
        series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect()
    };
    Ok(Some(values))
}

fn optional_text(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    Ok(text_values(df, name)?.unwrap_or_else(|| vec![None; df.height()]))
}

/// A column as floats. Missing columns and unparsable cells read as null.
fn numeric_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let series = column.as_materialized_series();
    if series.dtype() == &DataType::String {
        return Ok(series
            .str()?
            .into_iter()
            .map(|value| value.and_then(|v| v.trim().parse::<f64>().ok()))
            .collect());
    }
    Ok(series.cast(&DataType::Float64)?.f64()?.into_iter().collect())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
