//! Configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges.

use probe_core::ClassName;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_profiler(config)?;
    validate_plugins(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_profiler(config: &Config) -> ConfigResult<()> {
    let p = &config.profiler;

    if p.collector_host.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "profiler.collector_host".to_owned(),
            message: "collector host must not be empty".to_owned(),
        });
    }

    if p.sampling_rate == 0 {
        return Err(ConfigError::ValidationError {
            field: "profiler.sampling_rate".to_owned(),
            message: "sampling rate must be at least 1".to_owned(),
        });
    }

    Ok(())
}

fn validate_plugins(config: &Config) -> ConfigResult<()> {
    for name in &config.plugins.disabled {
        if !ClassName::is_valid(name) {
            return Err(ConfigError::ValidationError {
                field: "plugins.disabled".to_owned(),
                message: format!("'{name}' is not a fully-qualified plugin type name"),
            });
        }
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
