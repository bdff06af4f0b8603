//! Indicator plugins compiled into the binary.

use mara_indicators::{IndicatorPlugin, IndicatorRegistry, RegistryError};
use polars::prelude::*;

/// Plugins registered at startup, in load order.
pub(crate) fn builtin_plugins() -> Vec<&'static dyn IndicatorPlugin> {
    vec![&ExchangePlugin]
}

/// `exchange`: listing venue taken from the security code suffix.
#[derive(Debug)]
pub(crate) struct ExchangePlugin;

impl IndicatorPlugin for ExchangePlugin {
    fn name(&self) -> &str {
        "exchange"
    }

    fn register(&self, registry: &mut IndicatorRegistry) -> Result<(), RegistryError> {
        registry.register_custom_indicator("exchange", |securities| {
            let venues: Vec<Option<&str>> = securities
                .column("ts_code")?
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|code| code.and_then(exchange_of))
                .collect();
            Ok(Series::new("exchange".into(), venues))
        })
    }
}

fn exchange_of(ts_code: &str) -> Option<&'static str> {
    match ts_code.rsplit_once('.')?.1.to_ascii_uppercase().as_str() {
        "SH" => Some("SSE"),
        "SZ" => Some("SZSE"),
        "BJ" => Some("BSE"),
        _ => None,
    }
}
