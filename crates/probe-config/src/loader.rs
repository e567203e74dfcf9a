//! Config file loading.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load a config from a specific file path.
///
/// Missing sections and keys take their defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, is larger than the
/// size limit, cannot be parsed, or fails validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    // Check file size before reading to prevent OOM.
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let config = parse_str(&content, &path.display().to_string())?;
    info!(
        path = %path.display(),
        disabled_plugins = config.plugins.disabled.len(),
        "loaded agent config"
    );
    Ok(config)
}

/// Parse and validate TOML text. `origin` names the source in errors.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the text cannot be parsed or fails validation.
pub fn parse_str(content: &str, origin: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    })?;
    debug!(origin, "parsed config");

    validate::validate(&config)?;
    Ok(config)
}
