//! Probe Telemetry - Logging for the Probe instrumentation agent.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - Rolling file output for agents running inside a host process
//! - A bridge from the config file's `[logging]` table (`config` feature)
//!
//! # Example
//!
//! ```rust,no_run
//! use probe_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), probe_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("probe_plugins=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("agent logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
