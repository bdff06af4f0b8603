//! Indicator fetch pipeline.
//!
//! For each source API: query every security once with the union of the
//! requested columns, then normalize, reconcile, transform and reduce the
//! combined rows, and finally slice one [`IndicatorResult`] per indicator.
//! Custom indicators skip all of that and are computed from the security list.

use crate::dedup::deduplicate;
use crate::error::{Error, Result};
use crate::period::{DateRange, Season};
use crate::record::{Record, Row, extract_records, rows_to_frame};
use crate::transform::{
    AggregateMethod, aggregate, filter_season, filter_window, select_latest, to_single_quarter,
};
use mara_data::{DataProvider, QueryRequest};
use mara_indicators::{IDENTITY_FIELDS, IndicatorRegistry, IndicatorSource, PRECEDENCE_FIELDS};
use polars::prelude::*;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Granularity of an indicator result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// One row per security and reporting period
    Quarterly,
    /// Computed locally, one row per security
    Custom,
    /// Most recent period per security
    Latest,
    /// One statistic per security across periods
    Aggregated,
}

impl Frequency {
    /// Label used in output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Custom => "custom",
            Self::Latest => "latest",
            Self::Aggregated => "aggregated",
        }
    }

    /// Whether rows are identified by reporting period as well as security.
    pub const fn has_period(self) -> bool {
        matches!(self, Self::Quarterly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indicator's output.
#[derive(Debug, Clone)]
pub struct IndicatorResult {
    /// Indicator name, also the value column name
    pub name: String,
    /// Result granularity
    pub frequency: Frequency,
    /// `ts_code, ann_date, end_date, <name>` for API-backed indicators,
    /// `ts_code, <name>` for custom ones
    pub data: DataFrame,
}

/// What to fetch and how to shape it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Indicators, in output order
    pub indicators: Vec<String>,
    /// Reporting period window. Ignored in latest mode.
    pub date_range: Option<DateRange>,
    /// Fiscal quarter filter
    pub season: Season,
    /// Convert cumulative figures to single-quarter values
    pub single: bool,
    /// Keep only the most recent period per security
    pub latest: bool,
    /// Reduce across periods
    pub aggregate: Option<AggregateMethod>,
}

impl FetchOptions {
    /// Every period, cumulative, full series options for `indicators`.
    pub fn new<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indicators: indicators.into_iter().map(Into::into).collect(),
            date_range: None,
            season: Season::ALL,
            single: false,
            latest: false,
            aggregate: None,
        }
    }

    /// Restrict reporting periods to `range`.
    #[must_use]
    pub const fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Select a fiscal quarter, `0` for all.
    #[must_use]
    pub const fn season(mut self, quarter: u8) -> Self {
        self.season = Season::new(quarter);
        self
    }

    /// Toggle the single-quarter transform.
    #[must_use]
    pub const fn single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    /// Toggle latest mode.
    #[must_use]
    pub const fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Set or clear the aggregate statistic.
    #[must_use]
    pub const fn aggregate(mut self, method: Option<AggregateMethod>) -> Self {
        self.aggregate = method;
        self
    }

    /// Reject inconsistent combinations before anything is fetched.
    pub fn validate(&self) -> Result<()> {
        if self.indicators.iter().all(|name| name.trim().is_empty()) {
            return Err(Error::InvalidOptions("no indicators requested".to_string()));
        }
        if self.season.quarter() > 4 {
            return Err(Error::InvalidOptions(format!(
                "season must be 0-4, got {}",
                self.season.quarter()
            )));
        }
        if self.latest && self.aggregate.is_some() {
            return Err(Error::InvalidOptions(
                "latest and aggregate cannot be used together".to_string(),
            ));
        }
        if self.aggregate.is_some() && !self.season.is_quarter() {
            return Err(Error::InvalidOptions(
                "aggregate requires a season between 1 and 4".to_string(),
            ));
        }
        Ok(())
    }

    /// Window applied to requests and rows. None in latest mode.
    pub const fn effective_range(&self) -> Option<&DateRange> {
        if self.latest {
            None
        } else {
            self.date_range.as_ref()
        }
    }

    /// Frequency of API-backed results under these options.
    pub const fn frequency(&self) -> Frequency {
        if self.latest {
            Frequency::Latest
        } else if self.aggregate.is_some() {
            Frequency::Aggregated
        } else {
            Frequency::Quarterly
        }
    }

    /// Requested names, trimmed, blanks and repeats removed.
    fn unique_indicators(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for name in &self.indicators {
            let name = name.trim();
            if !name.is_empty() && !seen.iter().any(|s| s == name) {
                seen.push(name.to_string());
            }
        }
        seen
    }
}

#[derive(Clone, Copy)]
enum Plan<'r> {
    Api(&'r str),
    Custom,
}

/// Runs indicator requests against a provider.
#[derive(Debug)]
pub struct IndicatorFetcher<'r, P> {
    provider: P,
    registry: &'r IndicatorRegistry,
}

impl<'r, P: DataProvider> IndicatorFetcher<'r, P> {
    /// Create a fetcher.
    pub const fn new(provider: P, registry: &'r IndicatorRegistry) -> Self {
        Self { provider, registry }
    }

    /// Fetch every requested indicator for `ts_codes`.
    ///
    /// Results come back in request order. Unknown indicators fail the whole
    /// call before any request is sent. Provider errors abort the run; empty
    /// responses do not.
    pub async fn fetch_indicators(
        &self,
        ts_codes: &[String],
        options: &FetchOptions,
    ) -> Result<Vec<IndicatorResult>> {
        options.validate()?;
        let indicators = options.unique_indicators();

        let mut plans = Vec::with_capacity(indicators.len());
        for name in &indicators {
            let plan = match self.registry.source(name) {
                Some(IndicatorSource::Api(api)) => Plan::Api(api.as_str()),
                Some(IndicatorSource::Custom(_)) => Plan::Custom,
                None => return Err(Error::UnknownIndicator(name.clone())),
            };
            plans.push(plan);
        }

        // Group API-backed indicators, keeping first-seen API order.
        let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
        for (name, plan) in indicators.iter().zip(&plans) {
            if let Plan::Api(api) = *plan {
                match groups.iter_mut().find(|(group_api, _)| *group_api == api) {
                    Some((_, members)) => members.push(name.clone()),
                    None => groups.push((api, vec![name.clone()])),
                }
            }
        }

        let mut by_name: HashMap<String, IndicatorResult> = HashMap::new();
        for (name, plan) in indicators.iter().zip(&plans) {
            if matches!(plan, Plan::Custom) {
                by_name.insert(name.clone(), self.run_custom(name, ts_codes)?);
            }
        }
        for (api, members) in &groups {
            for result in self.fetch_api(api, members, ts_codes, options).await? {
                by_name.insert(result.name.clone(), result);
            }
        }

        Ok(indicators
            .iter()
            .filter_map(|name| by_name.remove(name))
            .collect())
    }

    fn run_custom(&self, name: &str, ts_codes: &[String]) -> Result<IndicatorResult> {
        let custom = self
            .registry
            .custom(name)
            .ok_or_else(|| Error::UnknownIndicator(name.to_string()))?;
        let securities = DataFrame::new(vec![
            Series::new("ts_code".into(), ts_codes.to_vec()).into(),
        ])?;

        let values = custom
            .compute(&securities)
            .map_err(|err| Error::CustomIndicator {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        if values.len() != ts_codes.len() {
            return Err(Error::CustomIndicator {
                name: name.to_string(),
                reason: format!(
                    "returned {} values for {} securities",
                    values.len(),
                    ts_codes.len()
                ),
            });
        }

        let mut data = securities;
        data.with_column(values.with_name(name.into()))?;
        debug!(indicator = name, rows = data.height(), "custom indicator computed");
        Ok(IndicatorResult {
            name: name.to_string(),
            frequency: Frequency::Custom,
            data,
        })
    }

    async fn fetch_api(
        &self,
        api: &str,
        indicators: &[String],
        ts_codes: &[String],
        options: &FetchOptions,
    ) -> Result<Vec<IndicatorResult>> {
        let spec = self.registry.api_spec(api);
        let cumulative = spec.is_some_and(|spec| spec.cumulative);
        let range = options.effective_range();

        let mut fields: Vec<String> = IDENTITY_FIELDS.iter().map(|f| f.to_string()).collect();
        for field in PRECEDENCE_FIELDS {
            if spec.is_some_and(|spec| spec.has_field(field)) {
                fields.push(field.to_string());
            }
        }
        for name in indicators {
            if !fields.contains(name) {
                fields.push(name.clone());
            }
        }

        info!(
            api,
            indicators = indicators.len(),
            securities = ts_codes.len(),
            "fetching"
        );

        let mut records: Vec<Record> = Vec::new();
        for ts_code in ts_codes {
            let mut request = QueryRequest::new(api)
                .ts_code(ts_code.as_str())
                .fields(fields.iter().cloned());
            if let Some(range) = range {
                let (start, end) = range.to_wire();
                request = request.date_window(start, end);
            }

            let frame = self.provider.query(&request).await?;
            if frame.height() == 0 {
                debug!(api, ts_code = %ts_code, "no rows");
                continue;
            }
            let Some(extracted) = extract_records(&frame, Some(ts_code.as_str()), indicators)?
            else {
                warn!(api, ts_code = %ts_code, "response without end_date discarded");
                continue;
            };
            if extracted.malformed > 0 {
                debug!(
                    api,
                    ts_code = %ts_code,
                    rows = extracted.malformed,
                    "malformed rows dropped"
                );
            }
            if extracted.records.iter().all(Record::is_blank) {
                debug!(api, ts_code = %ts_code, "all values missing");
                continue;
            }
            records.extend(extracted.records);
        }

        let rows = reconcile(records, cumulative, options);
        debug!(api, rows = rows.len(), "reconciled");

        let frame = rows_to_frame(&rows, indicators)?;
        let frequency = options.frequency();
        indicators
            .iter()
            .map(|name| -> Result<IndicatorResult> {
                let data = frame.select(["ts_code", "ann_date", "end_date", name.as_str()])?;
                Ok(IndicatorResult {
                    name: name.clone(),
                    frequency,
                    data,
                })
            })
            .collect()
    }
}

/// Normalize, reconcile, transform and reduce one API's rows.
///
/// `cumulative` marks APIs reporting year-to-date values; only those get the
/// single-quarter transform.
pub fn reconcile(mut records: Vec<Record>, cumulative: bool, options: &FetchOptions) -> Vec<Row> {
    filter_window(&mut records, options.effective_range());
    let mut records = deduplicate(records);
    if options.single && cumulative {
        to_single_quarter(&mut records);
    }
    filter_season(&mut records, options.season);

    if options.latest {
        select_latest(&records)
    } else if let Some(method) = options.aggregate {
        aggregate(&records, method)
    } else {
        records.iter().map(Record::to_row).collect()
    }
}
