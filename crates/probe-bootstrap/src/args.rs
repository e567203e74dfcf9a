//! Agent argument parsing.
//!
//! The agent is handed a single string of `key=value` pairs separated by
//! commas, e.g. `AGENT_TYPE=PLUGIN_TEST,agentId=web-01`.

use std::collections::BTreeMap;
use std::fmt;

/// Argument selecting which agent to boot.
pub const AGENT_TYPE: &str = "AGENT_TYPE";

/// Argument carrying the agent id.
pub const AGENT_ID: &str = "agentId";

/// Argument carrying the application name.
pub const APPLICATION_NAME: &str = "applicationName";

/// Parsed agent arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentArgs {
    values: BTreeMap<String, String>,
}

impl AgentArgs {
    /// Parse an argument string.
    ///
    /// Pairs are trimmed; a token without `=` gets an empty value, tokens
    /// with an empty key are ignored, and a repeated key keeps its last
    /// value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut values = BTreeMap::new();
        for token in raw.split(',') {
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            values.insert(key.to_string(), value.trim().to_string());
        }
        Self { values }
    }

    /// Look up an argument.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The agent type selected by [`AGENT_TYPE`].
    #[must_use]
    pub fn agent_type(&self) -> AgentType {
        match self.get(AGENT_TYPE) {
            Some(value) if value.eq_ignore_ascii_case(AgentType::PLUGIN_TEST) => {
                AgentType::PluginTest
            },
            _ => AgentType::Default,
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no argument was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for AgentArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.values {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Which agent implementation to boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgentType {
    /// The production agent.
    #[default]
    Default,
    /// The agent used by plugin integration tests.
    PluginTest,
}

impl AgentType {
    /// `AGENT_TYPE` value selecting [`AgentType::PluginTest`].
    pub const PLUGIN_TEST: &'static str = "PLUGIN_TEST";

    /// Boot class of the production agent.
    pub const DEFAULT_BOOT_CLASS: &'static str = "io.probe.profiler.DefaultAgent";

    /// Boot class of the plugin test agent.
    pub const PLUGIN_TEST_BOOT_CLASS: &'static str = "io.probe.test.PluginTestAgent";

    /// The boot class for this agent type.
    #[must_use]
    pub fn boot_class(self) -> &'static str {
        match self {
            Self::Default => Self::DEFAULT_BOOT_CLASS,
            Self::PluginTest => Self::PLUGIN_TEST_BOOT_CLASS,
        }
    }

    /// Whether test-only libraries are loaded.
    #[must_use]
    pub fn loads_test_libraries(self) -> bool {
        matches!(self, Self::PluginTest)
    }
}
