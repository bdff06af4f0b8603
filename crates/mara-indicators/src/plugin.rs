//! Startup-time registration of user-defined indicators.
//!
//! Plugins are plain values implementing [`IndicatorPlugin`]. They run once,
//! in the order given, before any fetch starts.

use crate::registry::{IndicatorRegistry, RegistryError};
use tracing::{debug, warn};

/// A unit of custom indicators.
pub trait IndicatorPlugin {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Add this plugin's indicators to the registry.
    fn register(&self, registry: &mut IndicatorRegistry) -> Result<(), RegistryError>;
}

/// Run every plugin in order.
///
/// Stops at the first failure. Indicators registered by earlier plugins stay
/// registered, but the error is returned so the caller can abort the run.
/// Returns the names of the plugins that loaded.
pub fn load_plugins<'a, I>(
    registry: &mut IndicatorRegistry,
    plugins: I,
) -> Result<Vec<String>, RegistryError>
where
    I: IntoIterator<Item = &'a dyn IndicatorPlugin>,
{
    let mut loaded = Vec::new();
    for plugin in plugins {
        let before = registry.len();
        if let Err(err) = plugin.register(registry) {
            warn!(plugin = plugin.name(), error = %err, "plugin registration failed");
            return Err(match err {
                RegistryError::Plugin { .. } => err,
                other => RegistryError::Plugin {
                    plugin: plugin.name().to_string(),
                    reason: other.to_string(),
                },
            });
        }
        debug!(
            plugin = plugin.name(),
            indicators = registry.len() - before,
            "plugin loaded"
        );
        loaded.push(plugin.name().to_string());
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    struct Constant {
        name: &'static str,
        indicator: &'static str,
    }

    impl IndicatorPlugin for Constant {
        fn name(&self) -> &str {
            self.name
        }

        fn register(&self, registry: &mut IndicatorRegistry) -> Result<(), RegistryError> {
            let column = self.indicator;
            registry.register_custom_indicator(self.indicator, move |securities| {
                Ok(Series::new(column.into(), vec![1.0; securities.height()]))
            })
        }
    }

    #[test]
    fn test_plugins_load_in_order() {
        let first = Constant {
            name: "first",
            indicator: "alpha",
        };
        let second = Constant {
            name: "second",
            indicator: "beta",
        };
        let mut registry = IndicatorRegistry::builtin();

        let loaded =
            load_plugins(&mut registry, [&first as &dyn IndicatorPlugin, &second]).unwrap();

        assert_eq!(loaded, ["first", "second"]);
        assert!(registry.is_custom("alpha"));
        assert!(registry.is_custom("beta"));
    }

    #[test]
    fn test_failure_stops_loading() {
        let clash = Constant {
            name: "clash",
            indicator: "roe",
        };
        let later = Constant {
            name: "later",
            indicator: "gamma",
        };
        let mut registry = IndicatorRegistry::builtin();

        let err =
            load_plugins(&mut registry, [&clash as &dyn IndicatorPlugin, &later]).unwrap_err();

        match err {
            RegistryError::Plugin { plugin, reason } => {
                assert_eq!(plugin, "clash");
                assert!(reason.contains("roe"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!registry.is_custom("gamma"));
        assert_eq!(registry.get_api("roe"), Some("fina_indicator"));
    }

    #[test]
    fn test_no_plugins() {
        let mut registry = IndicatorRegistry::builtin();
        let before = registry.len();
        let loaded = load_plugins(&mut registry, std::iter::empty()).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(registry.len(), before);
    }
}
