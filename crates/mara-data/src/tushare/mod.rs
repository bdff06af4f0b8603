//! Tushare Pro provider.
//!
//! All Tushare APIs are reached through a single JSON-over-HTTP endpoint:
//! the request names the API, passes the token and a parameter map, and the
//! response carries a column header plus row arrays.
//!
//! # Example
//!
//! ```no_run
//! use mara_data::tushare::{RetryPolicy, TushareClient};
//! use mara_data::{DataProvider, QueryRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TushareClient::new("<token>")?
//!         .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(60)));
//!     let request = QueryRequest::new("income")
//!         .ts_code("600000.SH")
//!         .fields(["ts_code", "end_date", "revenue"]);
//!     let table = client.query(&request).await?;
//!     println!("{} rows", table.height());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod response;
pub mod retry;

pub use client::{TUSHARE_BASE_URL, TushareClient};
pub use response::decode_table;
pub use retry::RetryPolicy;
