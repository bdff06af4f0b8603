//! In-memory provider serving canned tables.
//!
//! Used for offline replays and throughout the test suites. Tables are keyed
//! by API and, optionally, security code; a security-specific table wins over
//! an API-wide one.

use crate::error::{DataError, Result};
use crate::provider::{DataProvider, QueryRequest};
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;

type Key = (String, Option<String>);

/// Provider answering from tables registered up front.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    tables: HashMap<Key, DataFrame>,
    failures: HashMap<Key, String>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl MemoryProvider {
    /// Create an empty provider. Every query returns an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `table` for every request to `api`.
    #[must_use]
    pub fn with_table(mut self, api: &str, table: DataFrame) -> Self {
        self.tables.insert((api.to_string(), None), table);
        self
    }

    /// Serve `table` for requests to `api` about `ts_code`.
    #[must_use]
    pub fn with_security_table(mut self, api: &str, ts_code: &str, table: DataFrame) -> Self {
        self.tables
            .insert((api.to_string(), Some(ts_code.to_string())), table);
        self
    }

    /// Fail requests to `api` about `ts_code` with a provider error.
    #[must_use]
    pub fn with_failure(mut self, api: &str, ts_code: &str, msg: &str) -> Self {
        self.failures
            .insert((api.to_string(), Some(ts_code.to_string())), msg.to_string());
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, request: &QueryRequest) -> Result<DataFrame> {
        let specific = (request.api.clone(), request.ts_code.clone());
        if let Some(msg) = self.failures.get(&specific) {
            return Err(DataError::Api {
                api: request.api.clone(),
                code: -1,
                msg: msg.clone(),
            });
        }

        let table = match self.tables.get(&specific) {
            Some(table) => table.clone(),
            None => match self.tables.get(&(request.api.clone(), None)) {
                Some(table) => filter_security(table, request.ts_code.as_deref())?,
                None => return Ok(DataFrame::empty()),
            },
        };

        if request.fields.is_empty() {
            return Ok(table);
        }
        // Like the real endpoint, only requested columns come back.
        let present: Vec<&str> = request
            .fields
            .iter()
            .map(String::as_str)
            .filter(|field| table.column(field).is_ok())
            .collect();
        Ok(table.select(present)?)
    }
}

/// Keep the rows of an API-wide table that belong to `ts_code`.
fn filter_security(table: &DataFrame, ts_code: Option<&str>) -> Result<DataFrame> {
    let (Some(ts_code), Ok(codes)) = (ts_code, table.column("ts_code")) else {
        return Ok(table.clone());
    };
    let codes = codes.as_materialized_series().cast(&DataType::String)?;
    let mask: BooleanChunked = codes
        .str()?
        .into_iter()
        .map(|code| code == Some(ts_code))
        .collect();
    Ok(table.filter(&mask)?)
}

impl DataProvider for MemoryProvider {
    async fn query(&self, request: &QueryRequest) -> Result<DataFrame> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.lookup(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income() -> DataFrame {
        df!(
            "ts_code" => ["A", "A"],
            "end_date" => ["20230331", "20230630"],
            "revenue" => [1.0, 2.0],
            "n_income" => [0.5, 0.7]
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_requested_columns_only() {
        let provider = MemoryProvider::new().with_table("income", income());
        let request = QueryRequest::new("income")
            .ts_code("A")
            .fields(["ts_code", "end_date", "revenue", "missing"]);

        let df = provider.query(&request).await.unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["ts_code", "end_date", "revenue"]);
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_security_table_wins() {
        let specific = df!("ts_code" => ["B"], "end_date" => ["20231231"]).unwrap();
        let provider = MemoryProvider::new()
            .with_table("income", income())
            .with_security_table("income", "B", specific);

        let df = provider
            .query(&QueryRequest::new("income").ts_code("B"))
            .await
            .unwrap();
        assert_eq!(df.height(), 1);
    }

    #[tokio::test]
    async fn test_api_wide_table_filtered_by_security() {
        let provider = MemoryProvider::new().with_table("income", income());

        let own = provider
            .query(&QueryRequest::new("income").ts_code("A"))
            .await
            .unwrap();
        let other = provider
            .query(&QueryRequest::new("income").ts_code("Z"))
            .await
            .unwrap();
        assert_eq!(own.height(), 2);
        assert_eq!(other.height(), 0);
    }

    #[tokio::test]
    async fn test_unknown_api_is_empty() {
        let provider = MemoryProvider::new();
        let df = provider
            .query(&QueryRequest::new("cashflow"))
            .await
            .unwrap();
        assert_eq!(df.height(), 0);
    }

    #[tokio::test]
    async fn test_failure() {
        let provider = MemoryProvider::new().with_failure("income", "A", "boom");
        let result = provider
            .query(&QueryRequest::new("income").ts_code("A"))
            .await;
        assert!(matches!(result, Err(DataError::Api { .. })));
    }
}
