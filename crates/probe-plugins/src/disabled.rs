//! Disablement filter.

use std::collections::HashSet;

use probe_config::Config;
use tracing::info;

use crate::plugin::DiscoveredPlugin;

/// Plugin types switched off by configuration.
///
/// Matching is exact and case-sensitive on the plugin's type name.
#[derive(Debug, Clone, Default)]
pub struct DisabledPlugins {
    types: HashSet<String>,
}

impl DisabledPlugins {
    /// Build from explicit type names.
    #[must_use]
    pub fn new(types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the `[plugins] disabled` list.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.disabled_plugins().iter().cloned())
    }

    /// Whether `type_name` is disabled.
    #[must_use]
    pub fn is_disabled(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    /// Drop disabled plugins, keeping the order of the rest.
    ///
    /// Logs one `info` line per skipped plugin.
    #[must_use]
    pub fn filter(&self, plugins: Vec<DiscoveredPlugin>) -> Vec<DiscoveredPlugin> {
        plugins
            .into_iter()
            .filter(|plugin| {
                let disabled = self.is_disabled(plugin.type_name().as_str());
                if disabled {
                    info!(
                        plugin = %plugin.type_name(),
                        archive = %plugin.archive(),
                        "Skip disabled plugin"
                    );
                }
                !disabled
            })
            .collect()
    }

    /// Number of disabled types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is disabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_case_sensitive_match() {
        let disabled = DisabledPlugins::new(["com.example.RedisPlugin"]);
        assert!(disabled.is_disabled("com.example.RedisPlugin"));
        assert!(!disabled.is_disabled("com.example.redisplugin"));
        assert!(!disabled.is_disabled("com.example.RedisPlugin2"));
        assert!(!disabled.is_disabled("com.example"));
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_toml_str(
            "[plugins]\ndisabled = [\"com.example.RedisPlugin\", \"com.example.KafkaPlugin\"]\n",
        )
        .unwrap();
        let disabled = DisabledPlugins::from_config(&config);
        assert_eq!(disabled.len(), 2);
        assert!(disabled.is_disabled("com.example.KafkaPlugin"));
    }

    #[test]
    fn test_default_disables_nothing() {
        let disabled = DisabledPlugins::default();
        assert!(disabled.is_empty());
        assert!(disabled.filter(Vec::new()).is_empty());
    }
}
