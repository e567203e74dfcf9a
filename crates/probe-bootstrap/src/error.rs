//! Bootstrap error types.

use std::path::PathBuf;

use probe_config::ConfigError;
use probe_plugins::PluginError;

/// Errors raised while starting the agent.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// The agent home does not have the expected layout.
    #[error("invalid agent home {home}: {message}")]
    LayoutInvalid {
        /// The agent home.
        home: PathBuf,
        /// What is missing.
        message: String,
    },

    /// A required identity value is not set.
    #[error("{key} is not set")]
    IdentityMissing {
        /// The property or argument name.
        key: String,
    },

    /// An identity value is malformed.
    #[error("invalid {key} '{value}': {reason}")]
    IdentityInvalid {
        /// The property or argument name.
        key: String,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No configuration file was found.
    #[error("configuration file not found")]
    ConfigNotFound,

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Plugin loading failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// No entry point is registered for the boot class.
    #[error("boot class not found: {0}")]
    BootClassNotFound(String),

    /// The agent failed to start.
    #[error("agent start failed: {0}")]
    AgentStart(String),

    /// An archive could not be added to the bootstrap search path.
    #[error("cannot append {path} to bootstrap search: {message}")]
    BootstrapSearch {
        /// The archive.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bootstrap operations.
pub type BootResult<T> = Result<T, BootError>;
