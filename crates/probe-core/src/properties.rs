//! Property sources: the process identity source the bootstrap reads from.
//!
//! The agent reads its identity (agent id, application name) and a config
//! override from a [`PropertySource`], and records a few facts back into it
//! (log file path, version) for collaborators that start later.
//!
//! [`SystemProperties`] snapshots the process environment once and keeps
//! writes in an overlay; the real environment is never mutated.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Agent identifier key.
pub const AGENT_ID: &str = "PROBE_AGENT_ID";

/// Application name key.
pub const APPLICATION_NAME: &str = "PROBE_APPLICATION_NAME";

/// Explicit configuration file override.
pub const CONFIG_PATH: &str = "PROBE_CONFIG";

/// Log file path recorded at startup.
pub const LOG_PATH: &str = "PROBE_LOG";

/// Agent version recorded at startup.
pub const VERSION: &str = "PROBE_VERSION";

/// A readable and writable set of string properties.
pub trait PropertySource: Send + Sync {
    /// Look up a property.
    fn get(&self, key: &str) -> Option<String>;

    /// Set a property, replacing any previous value.
    fn set(&self, key: &str, value: &str);
}

/// Properties backed by a snapshot of the process environment.
#[derive(Debug, Default)]
pub struct SystemProperties {
    snapshot: HashMap<String, String>,
    overlay: RwLock<HashMap<String, String>>,
}

impl SystemProperties {
    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            snapshot: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
            overlay: RwLock::new(HashMap::new()),
        }
    }
}

impl PropertySource for SystemProperties {
    fn get(&self, key: &str) -> Option<String> {
        let overlay = self.overlay.read().unwrap_or_else(PoisonError::into_inner);
        overlay
            .get(key)
            .or_else(|| self.snapshot.get(key))
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut overlay = self.overlay.write().unwrap_or_else(PoisonError::into_inner);
        overlay.insert(key.to_owned(), value.to_owned());
    }
}

/// In-memory properties, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MapProperties {
    values: RwLock<HashMap<String, String>>,
}

impl MapProperties {
    /// Create an empty property map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }
}

impl PropertySource for MapProperties {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_owned());
    }
}
