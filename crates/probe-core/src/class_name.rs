//! Dotted class names and their archive entry paths.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A validated, fully-qualified dotted class name such as
/// `com.example.client.HttpPlugin` or `com.example.Outer$Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassName(String);

impl<'de> Deserialize<'de> for ClassName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl ClassName {
    /// Create a new `ClassName`, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, has an empty segment, or a
    /// segment contains characters other than ASCII alphanumerics, `_` and
    /// `$`, or starts with a digit.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Check whether a string is a valid class name without constructing one.
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        Self::validate(name).is_ok()
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Archive entry path holding this class (`a/b/C.class`).
    #[must_use]
    pub fn entry_path(&self) -> String {
        format!("{}.class", self.0.replace('.', "/"))
    }

    fn validate(name: &str) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::InvalidClassName {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };

        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        for segment in name.split('.') {
            let mut chars = segment.chars();
            let Some(first) = chars.next() else {
                return Err(invalid("name must not contain an empty segment"));
            };
            if first.is_ascii_digit() {
                return Err(invalid("segment must not start with a digit"));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            {
                return Err(invalid(
                    "segments may only contain ASCII alphanumerics, '_' and '$'",
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
