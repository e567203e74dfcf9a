//! Product identity.

/// Name and version of the agent, as reported in logs and recorded in the
/// property source at startup.
#[derive(Debug, Clone, Copy)]
pub struct ProductInfo;

impl ProductInfo {
    /// Product name. Also the prefix of every property key the agent owns.
    pub const NAME: &'static str = "probe";

    /// Product version, taken from the crate version at build time.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!ProductInfo::VERSION.is_empty());
        assert_eq!(ProductInfo::NAME, "probe");
    }
}
