//! Plugin discovery, scoping and isolated class injection for the Probe agent.
//!
//! Provides the pieces the agent uses to turn a list of plugin archives into
//! configured plugins:
//!
//! - [`ArchiveRef`] / [`PluginArchive`]: a plugin archive on disk and its
//!   indexed metadata
//! - [`Manifest`] / [`PackageList`]: the `Probe-Plugin-Package` declaration
//! - [`ScopeFilterChain`]: which classes a plugin may act on
//! - [`ServiceDescriptor`] / [`PluginCatalog`]: which plugin types an archive
//!   provides and how to instantiate them
//! - [`DisabledPlugins`]: the configured deny-list
//! - [`NamespaceTable`] / [`ArchiveClassInjector`]: per-archive isolated
//!   class resolution
//! - [`PluginSetup`]: the callback that configures one plugin
//! - [`ProfilerPluginLoader`]: ties the above together
//!
//! # Archive layout
//!
//! A plugin archive is a gzip-compressed tarball:
//!
//! ```text
//! META-INF/MANIFEST.MF                                         (optional)
//! META-INF/services/io.probe.bootstrap.plugin.ProfilerPlugin   (plugin types)
//! com/example/http/HttpPlugin.class
//! com/example/http/interceptor/ExecuteInterceptor.class
//! ```
//!
//! # Isolation
//!
//! Every archive gets its own namespace in the [`NamespaceTable`]. Class
//! requests carry the namespace id and are checked against that archive's
//! [`ScopeFilterChain`] before the archive is read, so one plugin can never
//! resolve another archive's classes or the agent's own.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod archive;
pub mod catalog;
pub mod descriptor;
pub mod disabled;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod injector;
pub mod loader;
pub mod manifest;
pub mod namespace;
pub mod package;
pub mod plugin;
pub mod setup;

pub use archive::{ArchiveRef, PluginArchive, is_plugin_archive};
pub use catalog::{PluginCatalog, PluginFactory};
pub use descriptor::ServiceDescriptor;
pub use disabled::DisabledPlugins;
pub use discovery::discover_plugins;
pub use error::{PluginError, PluginResult};
pub use filter::{
    ClassNameFilter, ScopeFilterChain, plugin_package_filter, profiler_package_skip_filter,
};
pub use injector::ArchiveClassInjector;
pub use loader::ProfilerPluginLoader;
pub use manifest::Manifest;
pub use namespace::{ClassRequest, InjectedClass, NamespaceId, NamespaceTable};
pub use package::{PackageList, read_plugin_packages};
pub use plugin::{DiscoveredPlugin, ProfilerPlugin};
pub use setup::{DefaultPluginSetup, PluginSetup, PluginSetupContext, SetupResult, Transformer};
