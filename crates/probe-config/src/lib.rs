#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for the Probe agent.
//!
//! The agent reads a single TOML file (`probe.toml`) once at startup and
//! keeps the resulting [`Config`] immutable for the rest of the process.
//!
//! # Usage
//!
//! ```rust,no_run
//! use probe_config::Config;
//!
//! let config = Config::load_file(std::path::Path::new("probe.toml")).unwrap();
//! for name in config.disabled_plugins() {
//!     println!("disabled: {name}");
//! }
//! ```
//!
//! # Locating the file
//!
//! Locating the file is the bootstrap's job: an explicit `PROBE_CONFIG`
//! override wins, otherwise `probe.toml` next to the agent install is used.
//! This crate only loads and validates a given path.

/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from a single file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is not valid TOML or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::parse_str(content, "<inline>")
    }

    /// Fully-qualified plugin type names that must not be loaded.
    #[must_use]
    pub fn disabled_plugins(&self) -> &[String] {
        &self.plugins.disabled
    }
}
