//! The plugin extension point.

use std::fmt;

use probe_core::ClassName;

use crate::archive::ArchiveRef;
use crate::error::PluginResult;
use crate::setup::PluginSetupContext;

/// An instrumentation plugin.
///
/// A plugin registers the transformations it wants through the
/// [`PluginSetupContext`] it is handed. Everything it touches is resolved
/// within its own archive's namespace.
pub trait ProfilerPlugin: Send + Sync {
    /// Configure the plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot be configured. The loader skips
    /// the plugin, or the rest of its archive if the archive itself became
    /// unavailable.
    fn setup(&self, context: &mut PluginSetupContext<'_>) -> PluginResult<()>;
}

/// A plugin instantiated from one archive's service descriptor.
pub struct DiscoveredPlugin {
    type_name: ClassName,
    archive: ArchiveRef,
    plugin: Box<dyn ProfilerPlugin>,
}

impl DiscoveredPlugin {
    /// Pair an instance with the type name it was created for.
    #[must_use]
    pub fn new(type_name: ClassName, archive: ArchiveRef, plugin: Box<dyn ProfilerPlugin>) -> Self {
        Self {
            type_name,
            archive,
            plugin,
        }
    }

    /// The plugin's type name, its identity.
    #[must_use]
    pub fn type_name(&self) -> &ClassName {
        &self.type_name
    }

    /// The archive the plugin was discovered in.
    #[must_use]
    pub fn archive(&self) -> &ArchiveRef {
        &self.archive
    }

    /// The plugin instance.
    #[must_use]
    pub fn plugin(&self) -> &dyn ProfilerPlugin {
        self.plugin.as_ref()
    }
}

impl fmt::Debug for DiscoveredPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredPlugin")
            .field("type_name", &self.type_name)
            .field("archive", &self.archive)
            .finish_non_exhaustive()
    }
}
