//! The plugin loader.
//!
//! Loading runs in two passes over the archive list:
//!
//! 1. **Listing.** Every archive is opened and its package declaration read.
//!    An archive that cannot be opened fails the whole load.
//! 2. **Setup.** Archive by archive, in the order given: register a
//!    namespace scoped by the archive's filter chain, discover the plugins
//!    its descriptor lists, drop disabled ones, and hand each remaining
//!    plugin to the [`PluginSetup`] callback with its own injector.
//!
//! Failures in the second pass stay local. A descriptor or provider error
//! skips the archive, a plugin whose setup fails is skipped, and an archive
//! that disappears mid-way loses its remaining plugins. Results keep archive
//! order, then descriptor order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::archive::{ArchiveRef, PluginArchive};
use crate::catalog::PluginCatalog;
use crate::disabled::DisabledPlugins;
use crate::discovery::discover_plugins;
use crate::error::{PluginError, PluginResult};
use crate::filter::{
    ClassNameFilter, ScopeFilterChain, plugin_package_filter, profiler_package_skip_filter,
};
use crate::injector::ArchiveClassInjector;
use crate::namespace::{NamespaceId, NamespaceTable};
use crate::package::{PackageList, read_plugin_packages};
use crate::setup::{PluginSetup, SetupResult};

/// Discovers, filters and configures plugins from a list of archives.
pub struct ProfilerPluginLoader {
    skip_filter: ClassNameFilter,
    disabled: DisabledPlugins,
    setup: Arc<dyn PluginSetup>,
    catalog: Arc<PluginCatalog>,
    namespaces: Arc<NamespaceTable>,
}

impl ProfilerPluginLoader {
    /// Create a loader.
    #[must_use]
    pub fn new(
        disabled: DisabledPlugins,
        setup: Arc<dyn PluginSetup>,
        catalog: Arc<PluginCatalog>,
    ) -> Self {
        Self {
            skip_filter: profiler_package_skip_filter(),
            disabled,
            setup,
            catalog,
            namespaces: Arc::new(NamespaceTable::new()),
        }
    }

    /// The namespaces registered by [`load`](Self::load).
    #[must_use]
    pub fn namespaces(&self) -> &Arc<NamespaceTable> {
        &self.namespaces
    }

    /// Build the filter chain for an archive's declared packages.
    ///
    /// The shared self-exclusion filter always comes first.
    #[must_use]
    pub fn create_filter_chain(&self, packages: &PackageList) -> ScopeFilterChain {
        ScopeFilterChain::new(vec![
            Arc::clone(&self.skip_filter),
            plugin_package_filter(packages),
        ])
    }

    /// Load every plugin in `archives`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ArchiveOpen`] if any archive cannot be opened
    /// during the listing pass. No plugin is set up in that case.
    pub fn load(&self, archives: &[ArchiveRef]) -> PluginResult<Vec<SetupResult>> {
        let mut listed = Vec::with_capacity(archives.len());
        for reference in archives {
            let archive = PluginArchive::open(reference)?;
            let packages = read_plugin_packages(&archive);
            listed.push((archive, packages));
        }

        let mut results = Vec::new();
        for (archive, packages) in listed {
            let filter = Arc::new(self.create_filter_chain(&packages));
            let namespace =
                self.namespaces
                    .register(archive.reference().clone(), packages.clone(), filter);

            if let Err(e) = self.load_archive(&archive, namespace, &packages, &mut results) {
                warn!(
                    archive = %archive.reference(),
                    error = %e,
                    "Skipping remaining plugins of archive"
                );
            }
        }

        info!(
            archives = archives.len(),
            plugins = results.len(),
            "Loaded plugins"
        );
        Ok(results)
    }

    fn load_archive(
        &self,
        archive: &PluginArchive,
        namespace: NamespaceId,
        packages: &PackageList,
        results: &mut Vec<SetupResult>,
    ) -> PluginResult<()> {
        let plugins = self.disabled.filter(discover_plugins(archive, &self.catalog)?);

        for plugin in plugins {
            info!(
                plugin = %plugin.type_name(),
                archive = %archive.reference(),
                packages = %packages,
                "Loading plugin"
            );

            archive.reference().verify_accessible()?;
            let injector = Arc::new(ArchiveClassInjector::new(
                Arc::clone(&self.namespaces),
                namespace,
                plugin.type_name().clone(),
            )?);

            match self.setup.setup_plugin(plugin.plugin(), injector) {
                Ok(result) => {
                    debug!(plugin = %plugin.type_name(), "Plugin setup complete");
                    results.push(result);
                },
                Err(e @ PluginError::ArchiveUnavailable { .. }) => return Err(e),
                Err(e) => {
                    warn!(
                        plugin = %plugin.type_name(),
                        archive = %archive.reference(),
                        error = %e,
                        "Plugin setup failed, skipping plugin"
                    );
                },
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for ProfilerPluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilerPluginLoader")
            .field("disabled", &self.disabled)
            .field("catalog", &self.catalog)
            .field("namespaces", &self.namespaces.len())
            .finish_non_exhaustive()
    }
}
