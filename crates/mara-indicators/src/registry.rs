//! Indicator Registry
//!
//! Maps every indicator name to exactly one source: a provider API column,
//! or a custom compute function. Built once at startup, read-only afterwards.

use crate::catalog::{self, ApiDefinition};
use polars::prelude::{DataFrame, PolarsResult, Series};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already registered
    #[error("indicator already registered: {0}")]
    DuplicateIndicator(String),

    /// The name is an identity or disclosure-precedence column
    #[error("reserved column name cannot be an indicator: {0}")]
    ReservedName(String),

    /// The target API is not in the catalog
    #[error("unknown api: {0}")]
    UnknownApi(String),

    /// A plugin failed to register
    #[error("plugin {plugin} failed: {reason}")]
    Plugin {
        /// Plugin name
        plugin: String,
        /// Failure description
        reason: String,
    },
}

/// Signature of a custom indicator.
///
/// Receives a table with one `ts_code` row per selected security and returns
/// one value per row, in the same order.
pub type CustomCompute = Arc<dyn Fn(&DataFrame) -> PolarsResult<Series> + Send + Sync>;

/// Column set of a provider API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSpec {
    /// API name
    pub name: String,
    /// Columns, provider order
    pub fields: Vec<String>,
    /// Values accumulate from the start of the fiscal year, so the API
    /// supports the single-quarter transform
    pub cumulative: bool,
}

impl ApiSpec {
    /// Create a spec.
    pub fn new<I, S>(name: impl Into<String>, fields: I, cumulative: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            cumulative,
        }
    }

    /// Whether the API returns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Columns that are indicators rather than bookkeeping.
    pub fn indicator_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|field| !catalog::is_reserved_field(field))
    }
}

impl From<ApiDefinition> for ApiSpec {
    fn from(definition: ApiDefinition) -> Self {
        Self::new(
            definition.name,
            definition.fields.iter().copied(),
            definition.cumulative,
        )
    }
}

/// A custom indicator's compute function.
#[derive(Clone)]
pub struct CustomIndicator {
    compute: CustomCompute,
}

impl CustomIndicator {
    /// Wrap a compute function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&DataFrame) -> PolarsResult<Series> + Send + Sync + 'static,
    {
        Self {
            compute: Arc::new(compute),
        }
    }

    /// Evaluate over the selected securities.
    pub fn compute(&self, securities: &DataFrame) -> PolarsResult<Series> {
        (self.compute)(securities)
    }
}

impl std::fmt::Debug for CustomIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomIndicator").finish_non_exhaustive()
    }
}

/// Where an indicator's values come from.
#[derive(Debug, Clone)]
pub enum IndicatorSource {
    /// A column of the named API
    Api(String),
    /// Computed locally
    Custom(CustomIndicator),
}

/// Indicator name -> source lookup.
#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    api_specs: HashMap<String, ApiSpec>,
    indicators: HashMap<String, IndicatorSource>,
}

impl IndicatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from the embedded catalog.
    pub fn builtin() -> Self {
        Self::from_specs(catalog::definitions().into_iter().map(ApiSpec::from))
    }

    /// Build a registry from API specs given in lookup order.
    ///
    /// Every non-reserved column becomes an indicator of the first API that
    /// lists it.
    pub fn from_specs(specs: impl IntoIterator<Item = ApiSpec>) -> Self {
        let mut registry = Self::new();
        for spec in specs {
            for field in spec.indicator_fields() {
                registry
                    .indicators
                    .entry(field.to_string())
                    .or_insert_with(|| IndicatorSource::Api(spec.name.clone()));
            }
            registry.api_specs.insert(spec.name.clone(), spec);
        }
        debug!(
            apis = registry.api_specs.len(),
            indicators = registry.indicators.len(),
            "indicator registry loaded"
        );
        registry
    }

    /// Map `name` to a column of `api`.
    pub fn register_indicator(&mut self, name: &str, api: &str) -> Result<(), RegistryError> {
        if !self.api_specs.contains_key(api) {
            return Err(RegistryError::UnknownApi(api.to_string()));
        }
        self.insert(name, IndicatorSource::Api(api.to_string()))
    }

    /// Register an indicator computed locally.
    pub fn register_custom_indicator<F>(
        &mut self,
        name: &str,
        compute: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&DataFrame) -> PolarsResult<Series> + Send + Sync + 'static,
    {
        self.insert(name, IndicatorSource::Custom(CustomIndicator::new(compute)))
    }

    fn insert(&mut self, name: &str, source: IndicatorSource) -> Result<(), RegistryError> {
        if catalog::is_reserved_field(name) {
            return Err(RegistryError::ReservedName(name.to_string()));
        }
        if self.indicators.contains_key(name) {
            return Err(RegistryError::DuplicateIndicator(name.to_string()));
        }
        self.indicators.insert(name.to_string(), source);
        Ok(())
    }

    /// API serving `name`, if it is API-backed.
    pub fn get_api(&self, name: &str) -> Option<&str> {
        match self.indicators.get(name) {
            Some(IndicatorSource::Api(api)) => Some(api),
            _ => None,
        }
    }

    /// Whether `name` is computed locally.
    pub fn is_custom(&self, name: &str) -> bool {
        matches!(self.indicators.get(name), Some(IndicatorSource::Custom(_)))
    }

    /// Source of `name`.
    pub fn source(&self, name: &str) -> Option<&IndicatorSource> {
        self.indicators.get(name)
    }

    /// Compute function of a custom indicator.
    pub fn custom(&self, name: &str) -> Option<&CustomIndicator> {
        match self.indicators.get(name) {
            Some(IndicatorSource::Custom(custom)) => Some(custom),
            _ => None,
        }
    }

    /// Spec of an API.
    pub fn api_spec(&self, api: &str) -> Option<&ApiSpec> {
        self.api_specs.get(api)
    }

    /// All indicator names, sorted.
    pub fn indicator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.indicators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered indicators.
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}
