//! The namespace table.
//!
//! Each plugin archive is registered once and receives a [`NamespaceId`].
//! Class requests carry that id; the table resolves them against the owning
//! archive only, after checking the archive's scope filter chain. Classes
//! are defined once per namespace: repeated requests return the bytes read
//! the first time.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use probe_core::ClassName;
use tracing::trace;

use crate::archive::{self, ArchiveRef};
use crate::error::{PluginError, PluginResult};
use crate::filter::ScopeFilterChain;
use crate::package::PackageList;

/// Identifier of one archive namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(usize);

impl NamespaceId {
    /// Position of the namespace in registration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns-{}", self.0)
    }
}

/// A request to resolve a class within a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRequest {
    /// Namespace to resolve in.
    pub namespace: NamespaceId,
    /// Class to resolve.
    pub class_name: ClassName,
}

impl ClassRequest {
    /// Create a request.
    #[must_use]
    pub fn new(namespace: NamespaceId, class_name: ClassName) -> Self {
        Self {
            namespace,
            class_name,
        }
    }
}

/// A class resolved from a plugin archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedClass {
    /// Namespace the class was defined in.
    pub namespace: NamespaceId,
    /// The class name.
    pub class_name: ClassName,
    /// Raw class bytes.
    pub bytes: Arc<[u8]>,
}

#[derive(Debug)]
struct Namespace {
    archive: ArchiveRef,
    packages: PackageList,
    filter: Arc<ScopeFilterChain>,
    defined: Mutex<Vec<(ClassName, Arc<[u8]>)>>,
}

/// Arena of archive namespaces.
#[derive(Debug, Default)]
pub struct NamespaceTable {
    namespaces: RwLock<Vec<Arc<Namespace>>>,
}

impl NamespaceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archive and the filter chain that scopes it.
    pub fn register(
        &self,
        archive: ArchiveRef,
        packages: PackageList,
        filter: Arc<ScopeFilterChain>,
    ) -> NamespaceId {
        let mut namespaces = self.namespaces.write().unwrap_or_else(PoisonError::into_inner);
        let id = NamespaceId(namespaces.len());
        trace!(namespace = %id, archive = %archive, "Registered namespace");
        namespaces.push(Arc::new(Namespace {
            archive,
            packages,
            filter,
            defined: Mutex::new(Vec::new()),
        }));
        id
    }

    fn get(&self, id: NamespaceId) -> PluginResult<Arc<Namespace>> {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        namespaces
            .get(id.0)
            .cloned()
            .ok_or(PluginError::UnknownNamespace(id))
    }

    /// The archive backing a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownNamespace`] for an unregistered id.
    pub fn archive(&self, id: NamespaceId) -> PluginResult<ArchiveRef> {
        Ok(self.get(id)?.archive.clone())
    }

    /// The package declaration a namespace was registered with.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownNamespace`] for an unregistered id.
    pub fn packages(&self, id: NamespaceId) -> PluginResult<PackageList> {
        Ok(self.get(id)?.packages.clone())
    }

    /// Whether `class_name` is in scope for a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownNamespace`] for an unregistered id.
    pub fn is_scoped(&self, id: NamespaceId, class_name: &str) -> PluginResult<bool> {
        Ok(self.get(id)?.filter.is_scoped(class_name))
    }

    /// Resolve a class from the namespace's archive.
    ///
    /// The scope check runs before the archive is read.
    ///
    /// # Errors
    ///
    /// - [`PluginError::UnknownNamespace`] for an unregistered id
    /// - [`PluginError::OutOfScope`] if the filter chain rejects the name
    /// - [`PluginError::ArchiveUnavailable`] if the archive cannot be read
    /// - [`PluginError::EntryNotFound`] if the archive lacks the class
    pub fn resolve_class(&self, request: &ClassRequest) -> PluginResult<InjectedClass> {
        let namespace = self.get(request.namespace)?;
        if !namespace.filter.is_scoped(request.class_name.as_str()) {
            return Err(PluginError::OutOfScope {
                class_name: request.class_name.to_string(),
                namespace: request.namespace,
            });
        }

        let mut defined = namespace
            .defined
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((_, bytes)) = defined.iter().find(|(name, _)| *name == request.class_name) {
            return Ok(InjectedClass {
                namespace: request.namespace,
                class_name: request.class_name.clone(),
                bytes: Arc::clone(bytes),
            });
        }

        let bytes: Arc<[u8]> =
            archive::read_entry(&namespace.archive, &request.class_name.entry_path())?.into();
        trace!(
            namespace = %request.namespace,
            class = %request.class_name,
            size = bytes.len(),
            "Defined class"
        );
        defined.push((request.class_name.clone(), Arc::clone(&bytes)));

        Ok(InjectedClass {
            namespace: request.namespace,
            class_name: request.class_name.clone(),
            bytes,
        })
    }

    /// Read a resource from the namespace's archive.
    ///
    /// A `.class` resource is subject to the same scope check as
    /// [`resolve_class`](Self::resolve_class).
    ///
    /// # Errors
    ///
    /// As for [`resolve_class`](Self::resolve_class).
    pub fn read_resource(&self, id: NamespaceId, path: &str) -> PluginResult<Vec<u8>> {
        let namespace = self.get(id)?;
        let path = path.trim_start_matches('/');
        if let Some(stem) = path.strip_suffix(".class") {
            let class_name = stem.replace('/', ".");
            if !namespace.filter.is_scoped(&class_name) {
                return Err(PluginError::OutOfScope {
                    class_name,
                    namespace: id,
                });
            }
        }
        archive::read_entry(&namespace.archive, path)
    }

    /// Classes defined in a namespace so far, in definition order.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownNamespace`] for an unregistered id.
    pub fn defined_classes(&self, id: NamespaceId) -> PluginResult<Vec<ClassName>> {
        let namespace = self.get(id)?;
        let defined = namespace
            .defined
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(defined.iter().map(|(name, _)| name.clone()).collect())
    }

    /// Number of registered namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no namespace is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
