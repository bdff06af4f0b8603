//! Period transforms and reductions over reconciled records.
//!
//! Every function here expects records sorted by `(ts_code, end_date)`, the
//! order [`deduplicate`](crate::dedup::deduplicate) produces.

use crate::error::Error;
use crate::period::{DateRange, Season};
use crate::record::{Record, Row};
use chrono::Datelike;
use std::fmt;
use std::str::FromStr;

/// Statistic used by aggregate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMethod {
    /// Arithmetic mean
    Mean,
    /// Median; the mean of the middle pair for even counts
    Median,
}

impl AggregateMethod {
    /// Name as accepted on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }

    /// Reduce the present values. `None` when there are none.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match self {
            Self::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Some(sorted[mid])
                }
            }
        }
    }
}

impl FromStr for AggregateMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            _ => Err(Error::UnsupportedAggregate(s.to_string())),
        }
    }
}

impl fmt::Display for AggregateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep records whose period falls inside `range`.
pub fn filter_window(records: &mut Vec<Record>, range: Option<&DateRange>) {
    if let Some(range) = range {
        records.retain(|record| range.contains(record.end_date));
    }
}

/// Keep records whose period is the exact end of the selected quarter.
pub fn filter_season(records: &mut Vec<Record>, season: Season) {
    records.retain(|record| season.matches(record.end_date));
}

/// Turn year-to-date values into single-quarter values in place.
///
/// Within each `(ts_code, calendar year)` a value becomes the current
/// cumulative figure minus the previous period's. The first period of a year
/// keeps its value, as does any period whose own or previous value is
/// missing.
pub fn to_single_quarter(records: &mut [Record]) {
    // Walk backwards so the previous record still holds its cumulative values.
    for idx in (1..records.len()).rev() {
        let (head, tail) = records.split_at_mut(idx);
        let previous = &head[idx - 1];
        let current = &mut tail[0];
        if previous.ts_code != current.ts_code
            || previous.end_date.year() != current.end_date.year()
        {
            continue;
        }
        for (value, prior) in current.values.iter_mut().zip(&previous.values) {
            if let (Some(v), Some(p)) = (*value, *prior) {
                *value = Some(v - p);
            }
        }
    }
}

/// Last record of each security.
pub fn select_latest(records: &[Record]) -> Vec<Row> {
    records
        .iter()
        .enumerate()
        .filter(|(idx, record)| {
            records
                .get(idx + 1)
                .is_none_or(|next| next.ts_code != record.ts_code)
        })
        .map(|(_, record)| record.to_row())
        .collect()
}

/// One row per security with every indicator reduced across periods.
///
/// Missing values are ignored. Period fields are null in the result.
pub fn aggregate(records: &[Record], method: AggregateMethod) -> Vec<Row> {
    let mut rows = Vec::new();
    for group in records.chunk_by(|a, b| a.ts_code == b.ts_code) {
        let width = group[0].values.len();
        let values = (0..width)
            .map(|idx| {
                let present: Vec<f64> =
                    group.iter().filter_map(|record| record.values[idx]).collect();
                method.apply(&present)
            })
            .collect();
        rows.push(Row {
            ts_code: group[0].ts_code.clone(),
            ann_date: None,
            end_date: None,
            values,
        });
    }
    rows
}
