//! Plugin catalog: the type-name to factory table used for instantiation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use probe_core::ClassName;
use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::plugin::ProfilerPlugin;

/// Creates a fresh plugin instance.
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn ProfilerPlugin> + Send + Sync>;

/// Known plugin types, keyed by the name a service descriptor lists.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: HashMap<ClassName, PluginFactory>,
}

impl PluginCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidTypeName`] if the name is malformed and
    /// [`PluginError::AlreadyRegistered`] if it already has a factory.
    pub fn register<F>(&mut self, type_name: &str, factory: F) -> PluginResult<()>
    where
        F: Fn() -> Box<dyn ProfilerPlugin> + Send + Sync + 'static,
    {
        let type_name = ClassName::new(type_name)?;
        if self.factories.contains_key(&type_name) {
            return Err(PluginError::AlreadyRegistered(type_name.to_string()));
        }
        debug!(plugin = %type_name, "Registered plugin factory");
        self.factories.insert(type_name, Arc::new(factory));
        Ok(())
    }

    /// Register a type that can be default-constructed.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_default<P>(&mut self, type_name: &str) -> PluginResult<()>
    where
        P: ProfilerPlugin + Default + 'static,
    {
        self.register(type_name, || Box::new(P::default()))
    }

    /// Instantiate `type_name`, if it has a factory.
    #[must_use]
    pub fn instantiate(&self, type_name: &ClassName) -> Option<Box<dyn ProfilerPlugin>> {
        self.factories.get(type_name).map(|factory| factory())
    }

    /// Whether `type_name` has a factory.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.keys().any(|k| k.as_str() == type_name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&ClassName> {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        names
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("types", &self.type_names())
            .finish()
    }
}
