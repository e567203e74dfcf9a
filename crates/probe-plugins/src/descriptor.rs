//! Service descriptors.
//!
//! `META-INF/services/<interface>` lists one implementing type per line.
//! Anything after `#` is a comment; blank lines are ignored.

use probe_core::ClassName;

/// Plugin types listed by one archive's service descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDescriptor {
    types: Vec<ClassName>,
}

impl ServiceDescriptor {
    /// Parse descriptor bytes.
    ///
    /// # Errors
    ///
    /// Returns a message if the bytes are not UTF-8 or a line is not a valid
    /// type name.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(bytes).map_err(|e| format!("not UTF-8: {e}"))?;
        Self::parse(text)
    }

    /// Parse descriptor text. Repeated names keep their first position.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid line.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut types: Vec<ClassName> = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.split_once('#').map_or(line, |(before, _)| before).trim();
            if line.is_empty() {
                continue;
            }
            let name = ClassName::new(line)
                .map_err(|e| format!("line {}: {e}", index.saturating_add(1)))?;
            if !types.contains(&name) {
                types.push(name);
            }
        }
        Ok(Self { types })
    }

    /// Listed types in descriptor order.
    #[must_use]
    pub fn types(&self) -> &[ClassName] {
        &self.types
    }

    /// Whether the descriptor lists no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(descriptor: &ServiceDescriptor) -> Vec<&str> {
        descriptor.types().iter().map(ClassName::as_str).collect()
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let descriptor = ServiceDescriptor::parse(
            "# HTTP plugins\n\ncom.example.http.HttpPlugin\n  com.example.http.Http2Plugin  # v2\n",
        )
        .unwrap();
        assert_eq!(
            names(&descriptor),
            ["com.example.http.HttpPlugin", "com.example.http.Http2Plugin"]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let descriptor = ServiceDescriptor::parse("a.B\nc.D\na.B\n").unwrap();
        assert_eq!(names(&descriptor), ["a.B", "c.D"]);
    }

    #[test]
    fn test_invalid_line() {
        let err = ServiceDescriptor::parse("a.B\nnot a type\n").unwrap_err();
        assert!(err.starts_with("line 2"), "{err}");
    }

    #[test]
    fn test_empty() {
        assert!(ServiceDescriptor::parse("# nothing\n").unwrap().is_empty());
    }
}
