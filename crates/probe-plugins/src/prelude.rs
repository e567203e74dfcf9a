//! Prelude module - commonly used types for convenient import.
//!
//! Use `use probe_plugins::prelude::*;` to import all essential types.

// Errors
pub use crate::{PluginError, PluginResult};

// Archives
pub use crate::{ArchiveRef, PackageList, PluginArchive};

// Plugins and setup
pub use crate::{
    ArchiveClassInjector, DefaultPluginSetup, DisabledPlugins, PluginCatalog, PluginSetup,
    PluginSetupContext, ProfilerPlugin, ProfilerPluginLoader, SetupResult,
};
