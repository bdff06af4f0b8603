//! Tushare Pro HTTP client.

use super::response::ApiResponse;
use super::retry::RetryPolicy;
use crate::error::{DataError, Result};
use crate::provider::{DataProvider, QueryRequest};
use polars::prelude::DataFrame;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

/// Tushare Pro endpoint. All APIs share one URL and are selected by `api_name`.
pub const TUSHARE_BASE_URL: &str = "https://api.tushare.pro";

/// Per-request transport timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tushare Pro client with a bounded retry loop.
pub struct TushareClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    retry: RetryPolicy,
}

impl TushareClient {
    /// Create a client with the default retry policy.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: TUSHARE_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point the client at another endpoint (proxies, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The retry policy in effect.
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Request body for one query.
    fn request_body(&self, request: &QueryRequest) -> Value {
        let mut params = Map::new();
        if let Some(ts_code) = &request.ts_code {
            params.insert("ts_code".to_string(), json!(ts_code));
        }
        if let Some(start) = &request.start_date {
            params.insert("start_date".to_string(), json!(start));
        }
        if let Some(end) = &request.end_date {
            params.insert("end_date".to_string(), json!(end));
        }

        json!({
            "api_name": request.api,
            "token": self.token,
            "params": params,
            "fields": request.fields_param(),
        })
    }

    /// Single attempt, no retry.
    async fn send(&self, request: &QueryRequest) -> Result<DataFrame> {
        let body = self.request_body(request);
        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(DataError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Api {
                api: request.api.clone(),
                code: i64::from(status.as_u16()),
                msg: format!("HTTP {}", status),
            });
        }

        let payload: ApiResponse = response.json().await.map_err(DataError::Network)?;
        let frame = payload.into_frame(&request.api)?;
        debug!(
            api = %request.api,
            ts_code = request.ts_code.as_deref().unwrap_or("*"),
            rows = frame.height(),
            "tushare query"
        );
        Ok(frame)
    }
}

impl DataProvider for TushareClient {
    async fn query(&self, request: &QueryRequest) -> Result<DataFrame> {
        self.retry.run(&request.api, || self.send(request)).await
    }
}

impl std::fmt::Debug for TushareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TushareClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
