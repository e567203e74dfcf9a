//! Package declaration reader.
//!
//! An archive declares which packages its plugins may act on through the
//! `Probe-Plugin-Package` manifest attribute: a comma-separated list of
//! package prefixes. Archives that declare nothing get the default
//! first-party plugin package.

use std::fmt;

use probe_core::namespace::{DEFAULT_PLUGIN_PACKAGE, PLUGIN_PACKAGE_ATTRIBUTE};
use tracing::{debug, warn};

use crate::archive::PluginArchive;

/// Ordered package prefixes an archive's plugins are scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageList(Vec<String>);

impl PackageList {
    /// The list granted to archives that declare no packages.
    #[must_use]
    pub fn default_list() -> Self {
        Self(vec![DEFAULT_PLUGIN_PACKAGE.to_string()])
    }

    /// Build a list from explicit prefixes.
    #[must_use]
    pub fn new(packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(packages.into_iter().map(Into::into).collect())
    }

    /// Split an attribute value on `,`, trimming tokens and dropping empty
    /// ones. Returns `None` if no token remains.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let packages: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        (!packages.is_empty()).then_some(Self(packages))
    }

    /// The prefixes, in declaration order.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.0
    }

    /// Whether this is the default list.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0.len() == 1 && self.0[0] == DEFAULT_PLUGIN_PACKAGE
    }
}

impl fmt::Display for PackageList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Read the package declaration of an opened archive.
///
/// Never fails: a missing or unreadable manifest, a missing attribute, or an
/// attribute with no tokens all yield [`PackageList::default_list`].
#[must_use]
pub fn read_plugin_packages(archive: &PluginArchive) -> PackageList {
    let manifest = match archive.manifest() {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(
                archive = %archive.reference(),
                error = %e,
                "Unreadable plugin manifest, treating as absent"
            );
            None
        },
    };

    let declared = manifest
        .as_ref()
        .and_then(|m| m.get(PLUGIN_PACKAGE_ATTRIBUTE))
        .and_then(PackageList::parse);

    if let Some(packages) = declared {
        debug!(
            archive = %archive.reference(),
            packages = %packages,
            "Read plugin package declaration"
        );
        return packages;
    }

    let packages = PackageList::default_list();
    warn!(
        archive = %archive.reference(),
        attribute = PLUGIN_PACKAGE_ATTRIBUTE,
        packages = %packages,
        "Plugin archive declares no packages, using default"
    );
    packages
}
