//! Archive manifest parsing.
//!
//! Only the main section is read: `Name: value` lines up to the first blank
//! line. A line starting with a single space continues the previous value.
//! Attribute names compare case-insensitively.

/// Main-section attributes of `META-INF/MANIFEST.MF`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest bytes.
    ///
    /// # Errors
    ///
    /// Returns a message if the bytes are not UTF-8 or a line is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(bytes).map_err(|e| format!("not UTF-8: {e}"))?;
        Self::parse(text)
    }

    /// Parse manifest text.
    ///
    /// # Errors
    ///
    /// Returns a message if a line has no `:` separator, an empty name, or is
    /// a continuation with nothing to continue.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut attributes: Vec<(String, String)> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index.saturating_add(1);
            if line.is_empty() {
                // End of the main section.
                break;
            }
            if let Some(rest) = line.strip_prefix(' ') {
                let Some((_, value)) = attributes.last_mut() else {
                    return Err(format!("line {line_no}: continuation without an attribute"));
                };
                value.push_str(rest);
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(format!("line {line_no}: expected 'Name: value'"));
            };
            let name = name.trim_end();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(format!("line {line_no}: invalid attribute name '{name}'"));
            }
            let value = value.strip_prefix(' ').unwrap_or(value);
            attributes.push((name.to_string(), value.to_string()));
        }

        Ok(Self { attributes })
    }

    /// Look up a main attribute. The first occurrence wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All main attributes in file order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
