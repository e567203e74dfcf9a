//! Isolated class injection.

use std::sync::Arc;

use probe_core::ClassName;
use tracing::debug;

use crate::archive::ArchiveRef;
use crate::error::{PluginError, PluginResult};
use crate::namespace::{ClassRequest, InjectedClass, NamespaceId, NamespaceTable};

/// Class-injection context for one plugin of one archive.
///
/// Bound to the archive's namespace: it can only resolve classes and
/// resources from that archive, and only names its scope filter chain
/// accepts.
#[derive(Debug)]
pub struct ArchiveClassInjector {
    namespace: NamespaceId,
    plugin_type: ClassName,
    archive: ArchiveRef,
    table: Arc<NamespaceTable>,
}

impl ArchiveClassInjector {
    /// Bind an injector for `plugin_type` to a registered namespace.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownNamespace`] if `namespace` is not in
    /// `table`.
    pub fn new(
        table: Arc<NamespaceTable>,
        namespace: NamespaceId,
        plugin_type: ClassName,
    ) -> PluginResult<Self> {
        let archive = table.archive(namespace)?;
        Ok(Self {
            namespace,
            plugin_type,
            archive,
            table,
        })
    }

    /// The namespace this injector is bound to.
    #[must_use]
    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    /// The plugin this injector serves.
    #[must_use]
    pub fn plugin_type(&self) -> &ClassName {
        &self.plugin_type
    }

    /// The archive this injector reads from.
    #[must_use]
    pub fn archive(&self) -> &ArchiveRef {
        &self.archive
    }

    /// Whether `class_name` is in this plugin's scope.
    #[must_use]
    pub fn is_scoped(&self, class_name: &str) -> bool {
        self.table
            .is_scoped(self.namespace, class_name)
            .unwrap_or(false)
    }

    /// Resolve `class_name` from the archive.
    ///
    /// # Errors
    ///
    /// [`PluginError::InvalidTypeName`] for a malformed name, otherwise see
    /// [`NamespaceTable::resolve_class`].
    pub fn inject_class(&self, class_name: &str) -> PluginResult<InjectedClass> {
        let class_name = ClassName::new(class_name)?;
        self.resolve(&ClassRequest::new(self.namespace, class_name))
    }

    /// Resolve a prepared request.
    ///
    /// # Errors
    ///
    /// [`PluginError::NamespaceMismatch`] if the request targets another
    /// namespace, otherwise see [`NamespaceTable::resolve_class`].
    pub fn resolve(&self, request: &ClassRequest) -> PluginResult<InjectedClass> {
        if request.namespace != self.namespace {
            return Err(PluginError::NamespaceMismatch {
                bound: self.namespace,
                requested: request.namespace,
            });
        }
        let class = self.table.resolve_class(request)?;
        debug!(
            plugin = %self.plugin_type,
            namespace = %self.namespace,
            class = %class.class_name,
            "Injected class"
        );
        Ok(class)
    }

    /// Read a non-class resource from the archive.
    ///
    /// # Errors
    ///
    /// See [`NamespaceTable::read_resource`].
    pub fn resource(&self, path: &str) -> PluginResult<Vec<u8>> {
        self.table.read_resource(self.namespace, path)
    }
}
