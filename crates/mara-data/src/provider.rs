//! The data provider seam.
//!
//! Everything above this crate talks to the remote provider through
//! [`DataProvider`], so tests can swap in canned tables.

use crate::error::Result;
use polars::prelude::DataFrame;
use std::future::Future;

/// A single table request against one provider API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Provider API name (e.g. `income`)
    pub api: String,
    /// Security code filter
    pub ts_code: Option<String>,
    /// Inclusive lower bound on the reporting period, `YYYYMMDD`
    pub start_date: Option<String>,
    /// Inclusive upper bound on the reporting period, `YYYYMMDD`
    pub end_date: Option<String>,
    /// Columns to return
    pub fields: Vec<String>,
}

impl QueryRequest {
    /// Create a request for all rows of an API.
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            ts_code: None,
            start_date: None,
            end_date: None,
            fields: Vec::new(),
        }
    }

    /// Restrict the request to one security.
    pub fn ts_code(mut self, ts_code: impl Into<String>) -> Self {
        self.ts_code = Some(ts_code.into());
        self
    }

    /// Restrict the request to a `YYYYMMDD` window.
    pub fn date_window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    /// Set the requested columns.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Comma-joined field list as sent on the wire.
    pub fn fields_param(&self) -> String {
        self.fields.join(",")
    }
}

/// Remote source of tabular financial data.
///
/// Implementations own their retry behaviour. An empty table is a valid
/// answer and must not be reported as an error.
pub trait DataProvider {
    /// Run a table query.
    fn query(&self, request: &QueryRequest) -> impl Future<Output = Result<DataFrame>>;

    /// Fetch the basic security listing with the given columns.
    fn stock_basic(&self, fields: &[&str]) -> impl Future<Output = Result<DataFrame>> {
        let request = QueryRequest::new("stock_basic").fields(fields.iter().copied());
        async move { self.query(&request).await }
    }
}

impl<P: DataProvider> DataProvider for &P {
    fn query(&self, request: &QueryRequest) -> impl Future<Output = Result<DataFrame>> {
        (**self).query(request)
    }

    fn stock_basic(&self, fields: &[&str]) -> impl Future<Output = Result<DataFrame>> {
        (**self).stock_basic(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = QueryRequest::new("income")
            .ts_code("600000.SH")
            .date_window("20200101", "20231231")
            .fields(["ts_code", "end_date", "revenue"]);

        assert_eq!(request.api, "income");
        assert_eq!(request.ts_code.as_deref(), Some("600000.SH"));
        assert_eq!(request.start_date.as_deref(), Some("20200101"));
        assert_eq!(request.end_date.as_deref(), Some("20231231"));
        assert_eq!(request.fields_param(), "ts_code,end_date,revenue");
    }

    #[test]
    fn test_request_without_window() {
        let request = QueryRequest::new("stock_basic");
        assert!(request.start_date.is_none());
        assert!(request.fields.is_empty());
        assert_eq!(request.fields_param(), "");
    }
}
