//! Configuration types for the Probe agent.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header, or
//! a missing section, yields a working configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the agent, loaded once from `probe.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Collector endpoint and sampling.
    pub profiler: ProfilerSection,
    /// Plugin loading policy.
    pub plugins: PluginsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ProfilerSection
// ---------------------------------------------------------------------------

/// Settings handed to the agent proper. The bootstrap only carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerSection {
    /// Collector host the agent reports to.
    pub collector_host: String,
    /// Collector port.
    pub collector_port: u16,
    /// Sample one transaction out of every `sampling_rate`.
    pub sampling_rate: u32,
    /// Overrides the detected application server type.
    pub application_server_type: Option<String>,
}

impl Default for ProfilerSection {
    fn default() -> Self {
        Self {
            collector_host: "127.0.0.1".to_owned(),
            collector_port: 9994,
            sampling_rate: 1,
            application_server_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PluginsSection
// ---------------------------------------------------------------------------

/// Plugin loading policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Fully-qualified plugin type names to skip at load time. Matching is
    /// exact and case-sensitive.
    pub disabled: Vec<String>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["probe_plugins=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
