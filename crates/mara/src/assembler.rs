//! Output table assembly.
//!
//! Indicator results of the same frequency are joined into one wide table,
//! then the security listing columns are attached in front.

use crate::error::Result;
use crate::pipeline::{Frequency, IndicatorResult};
use crate::record::text_values;
use mara_indicators::{BASIC_FIELDS, IDENTITY_FIELDS};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// One output section.
#[derive(Debug, Clone)]
pub struct OutputTable {
    /// Frequency shared by every indicator in the table
    pub frequency: Frequency,
    /// Listing columns, identity columns, then indicators in request order
    pub data: DataFrame,
}

impl OutputTable {
    /// Whether the table carries a non-null `end_date` column.
    pub fn has_period(&self) -> bool {
        self.data
            .column("end_date")
            .is_ok_and(|column| column.null_count() < column.len())
    }
}

/// Build one table per frequency, in order of first appearance.
pub fn build_output_tables(
    basic_info: &DataFrame,
    results: &[IndicatorResult],
) -> Result<Vec<OutputTable>> {
    let mut groups: Vec<(Frequency, Vec<&IndicatorResult>)> = Vec::new();
    for result in results {
        match groups.iter_mut().find(|(frequency, _)| *frequency == result.frequency) {
            Some((_, members)) => members.push(result),
            None => groups.push((result.frequency, vec![result])),
        }
    }

    let info = listing_columns(basic_info)?;
    let mut tables = Vec::with_capacity(groups.len());
    for (frequency, members) in groups {
        let merged = merge_results(frequency, &members)?;
        let data = attach_listing(info.as_ref(), merged, &members)?;
        let data = sort_by_keys(data, frequency)?;
        debug!(
            frequency = %frequency,
            rows = data.height(),
            cols = data.width(),
            "table assembled"
        );
        tables.push(OutputTable { frequency, data });
    }
    Ok(tables)
}

/// Left-join a group onto its largest member.
///
/// Keys are `(ts_code, end_date)` for period results and `ts_code` otherwise.
fn merge_results(frequency: Frequency, results: &[&IndicatorResult]) -> Result<DataFrame> {
    // First member with the most rows; later ties do not displace it.
    let mut base = 0;
    for (idx, result) in results.iter().enumerate() {
        if result.data.height() > results[base].data.height() {
            base = idx;
        }
    }

    let mut merged = results[base].data.clone();
    for (idx, result) in results.iter().enumerate() {
        if idx == base {
            continue;
        }
        let by_period = frequency.has_period()
            && has_column(&merged, "end_date")
            && has_column(&result.data, "end_date");
        let keys: Vec<&str> = if by_period {
            vec!["ts_code", "end_date"]
        } else {
            vec!["ts_code"]
        };

        // Identity columns other than the keys come from the base table only.
        let right_columns: Vec<&str> = result
            .data
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| keys.contains(name) || !IDENTITY_FIELDS.contains(name))
            .collect();
        let right = result.data.select(right_columns)?;

        let on: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
        merged = merged
            .lazy()
            .join(right.lazy(), on.clone(), on, JoinArgs::new(JoinType::Left))
            .collect()?;
    }
    Ok(merged)
}

/// Listing columns, one row per security. `None` when there is nothing to attach.
fn listing_columns(basic_info: &DataFrame) -> Result<Option<DataFrame>> {
    let Some(codes) = text_values(basic_info, "ts_code")? else {
        return Ok(None);
    };
    if basic_info.height() == 0 {
        return Ok(None);
    }

    let present: Vec<&str> = BASIC_FIELDS
        .iter()
        .copied()
        .filter(|field| has_column(basic_info, field))
        .collect();
    let mut seen = HashSet::new();
    let first: BooleanChunked = codes
        .into_iter()
        .map(|code| code.is_some_and(|code| seen.insert(code)))
        .collect();

    let mut info = basic_info.select(present)?.filter(&first)?;
    let codes = info
        .column("ts_code")?
        .as_materialized_series()
        .cast(&DataType::String)?;
    info.with_column(codes)?;
    Ok(Some(info))
}

/// Put listing columns in front and order the rest.
fn attach_listing(
    info: Option<&DataFrame>,
    data: DataFrame,
    results: &[&IndicatorResult],
) -> Result<DataFrame> {
    let data = match info {
        Some(info) if has_column(&data, "ts_code") => data
            .lazy()
            .join(
                info.clone().lazy(),
                [col("ts_code")],
                [col("ts_code")],
                JoinArgs::new(JoinType::Left),
            )
            .collect()?,
        _ => data,
    };

    let mut order: Vec<String> = Vec::with_capacity(data.width());
    let leading = BASIC_FIELDS.iter().chain(IDENTITY_FIELDS.iter());
    let indicators = results.iter().map(|result| &result.name);
    for name in leading.map(|s| s.to_string()).chain(indicators.cloned()) {
        if has_column(&data, &name) && !order.contains(&name) {
            order.push(name);
        }
    }
    for name in data.get_column_names() {
        if !order.iter().any(|o| o == name.as_str()) {
            order.push(name.to_string());
        }
    }
    Ok(data.select(order)?)
}

/// Order rows by `(ts_code, end_date)`, or `ts_code` alone without periods.
fn sort_by_keys(data: DataFrame, frequency: Frequency) -> Result<DataFrame> {
    if !has_column(&data, "ts_code") {
        return Ok(data);
    }
    let mut keys = vec![col("ts_code")];
    if frequency.has_period() && has_column(&data, "end_date") {
        keys.push(col("end_date"));
    }
    let options = SortMultipleOptions::default()
        .with_nulls_last(true)
        .with_maintain_order(true);
    Ok(data.lazy().sort_by_exprs(keys, options).collect()?)
}

/// Sort tables without a period column by `column`.
///
/// Period tables keep their `(ts_code, end_date)` order, as do tables that
/// lack the column.
pub fn sort_tables(tables: &mut [OutputTable], column: &str, descending: bool) -> Result<()> {
    for table in tables.iter_mut() {
        if !has_column(&table.data, column) || table.has_period() {
            continue;
        }
        let options = SortMultipleOptions::default()
            .with_order_descending(descending)
            .with_nulls_last(true)
            .with_maintain_order(true);
        table.data = table
            .data
            .clone()
            .lazy()
            .sort_by_exprs([col(column)], options)
            .collect()?;
    }
    Ok(())
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}
