//! Plugin error types.

use std::path::PathBuf;

use crate::namespace::NamespaceId;

/// Errors from plugin discovery, scoping and injection.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A plugin archive could not be opened or indexed.
    ///
    /// Raised while listing archives; aborts the whole load.
    #[error("failed to open plugin archive {path}: {message}")]
    ArchiveOpen {
        /// Path to the archive.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// A plugin archive disappeared or became unreadable after listing.
    ///
    /// Fatal for the remaining plugins of that archive only.
    #[error("plugin archive unavailable {path}: {message}")]
    ArchiveUnavailable {
        /// Path to the archive.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// The archive manifest is malformed.
    #[error("malformed manifest in {path}: {message}")]
    ManifestParse {
        /// Path to the archive.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// The archive's service descriptor is malformed.
    #[error("malformed service descriptor in {path}: {message}")]
    DescriptorParse {
        /// Path to the archive.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// A descriptor names a plugin type whose class the archive does not ship.
    #[error("plugin type {type_name} listed in {path} is not packaged in that archive")]
    ProviderNotInArchive {
        /// The listed plugin type.
        type_name: String,
        /// Archive whose descriptor listed it.
        path: PathBuf,
    },

    /// A descriptor names a plugin type no factory is registered for.
    #[error("plugin type {type_name} listed in {path} has no registered factory")]
    ProviderNotFound {
        /// The unresolved plugin type.
        type_name: String,
        /// Archive whose descriptor listed it.
        path: PathBuf,
    },

    /// A factory for this plugin type is already registered.
    #[error("plugin type already registered: {0}")]
    AlreadyRegistered(String),

    /// A class or type name is malformed.
    #[error("invalid type name: {0}")]
    InvalidTypeName(String),

    /// The class is outside the plugin's scope.
    #[error("class {class_name} is out of scope for namespace {namespace}")]
    OutOfScope {
        /// The rejected class.
        class_name: String,
        /// Namespace the request was made in.
        namespace: NamespaceId,
    },

    /// A request was made through an injector bound to another namespace.
    #[error("request for namespace {requested} sent to injector bound to {bound}")]
    NamespaceMismatch {
        /// Namespace the injector is bound to.
        bound: NamespaceId,
        /// Namespace carried by the request.
        requested: NamespaceId,
    },

    /// No namespace with this id exists.
    #[error("unknown namespace: {0}")]
    UnknownNamespace(NamespaceId),

    /// The archive has no entry with this name.
    #[error("entry {entry} not found in {path}")]
    EntryNotFound {
        /// Path to the archive.
        path: PathBuf,
        /// Entry name.
        entry: String,
    },

    /// A plugin failed to configure itself.
    #[error("plugin setup failed: {plugin} - {message}")]
    SetupFailed {
        /// The plugin type.
        plugin: String,
        /// Failure reason.
        message: String,
    },
}

impl From<probe_core::CoreError> for PluginError {
    fn from(e: probe_core::CoreError) -> Self {
        Self::InvalidTypeName(e.to_string())
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
