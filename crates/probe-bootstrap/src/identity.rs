//! Agent identity resolution.
//!
//! The agent id and application name come from the agent arguments first and
//! fall back to the property source. Both are required.

use probe_core::{PropertySource, properties};
use tracing::{info, warn};

use crate::args::{self, AgentArgs};
use crate::error::{BootError, BootResult};

/// Maximum length of an agent id or application name.
pub const MAX_ID_LENGTH: usize = 24;

/// The identity the agent reports under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    /// Unique id of this agent instance.
    pub agent_id: String,
    /// Logical application the agent belongs to.
    pub application_name: String,
}

/// Resolves and validates the agent identity.
pub struct IdValidator<'a> {
    args: &'a AgentArgs,
    properties: &'a dyn PropertySource,
}

impl<'a> IdValidator<'a> {
    /// Create a validator over the given sources.
    #[must_use]
    pub fn new(args: &'a AgentArgs, properties: &'a dyn PropertySource) -> Self {
        Self { args, properties }
    }

    /// Resolve the agent id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is missing or invalid.
    pub fn agent_id(&self) -> BootResult<String> {
        self.resolve(args::AGENT_ID, properties::AGENT_ID)
    }

    /// Resolve the application name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or invalid.
    pub fn application_name(&self) -> BootResult<String> {
        self.resolve(args::APPLICATION_NAME, properties::APPLICATION_NAME)
    }

    /// Resolve both values.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid value.
    pub fn validate(&self) -> BootResult<AgentIdentity> {
        Ok(AgentIdentity {
            agent_id: self.agent_id()?,
            application_name: self.application_name()?,
        })
    }

    fn resolve(&self, arg_key: &str, property_key: &str) -> BootResult<String> {
        let (key, value) = match self.args.get(arg_key) {
            Some(value) => (arg_key, value.to_string()),
            None => match self.properties.get(property_key) {
                Some(value) => (property_key, value),
                None => {
                    warn!(argument = arg_key, property = property_key, "Agent identity value not set");
                    return Err(BootError::IdentityMissing {
                        key: property_key.to_string(),
                    });
                },
            },
        };

        let value = value.trim();
        if value.is_empty() {
            warn!(key, "Agent identity value is empty");
            return Err(BootError::IdentityMissing {
                key: key.to_string(),
            });
        }
        if let Err(reason) = validate_id(value) {
            warn!(key, value, reason = %reason, "Invalid agent identity value");
            return Err(BootError::IdentityInvalid {
                key: key.to_string(),
                value: value.to_string(),
                reason,
            });
        }

        info!(key, value, "Resolved agent identity value");
        Ok(value.to_string())
    }
}

/// Check an id against the allowed length and character set
/// (`[A-Za-z0-9._-]`).
///
/// # Errors
///
/// Returns a description of the first violation.
pub fn validate_id(value: &str) -> Result<(), String> {
    if value.len() > MAX_ID_LENGTH {
        return Err(format!(
            "too long ({} > {MAX_ID_LENGTH} characters)",
            value.len()
        ));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("invalid character '{c}'"));
    }
    Ok(())
}
