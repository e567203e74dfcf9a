//! The agent contract and the loading context that boots it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use probe_config::Config;
use probe_plugins::ArchiveRef;
use tracing::info;

use crate::args::AgentArgs;
use crate::error::{BootError, BootResult};
use crate::identity::AgentIdentity;

/// A bootable agent.
pub trait Agent: Send + Sync {
    /// Start the agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent cannot start.
    fn start(&self) -> BootResult<()>;

    /// Stop the agent. Must tolerate being called on an agent that is
    /// already stopped.
    fn stop(&self);
}

/// Shared services handed to the agent, keyed by type.
#[derive(Clone, Default)]
pub struct ServiceHandles {
    handles: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceHandles {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service, replacing any previous one of the same type.
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, service: Arc<T>) -> Self {
        self.insert(service);
        self
    }

    /// Add a service, replacing any previous one of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, service: Arc<T>) {
        self.handles.insert(TypeId::of::<T>(), service);
    }

    /// Look up a service by type.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.handles
            .get(&TypeId::of::<T>())
            .and_then(|handle| Arc::clone(handle).downcast::<T>().ok())
    }

    /// Number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl fmt::Debug for ServiceHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandles")
            .field("len", &self.handles.len())
            .finish()
    }
}

/// Everything an agent is booted with.
#[derive(Debug, Clone)]
pub struct AgentOption {
    /// Agent identity.
    pub identity: AgentIdentity,
    /// Parsed agent arguments.
    pub agent_args: AgentArgs,
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Plugin archives, in load order.
    pub plugin_archives: Vec<ArchiveRef>,
    /// Archives appended to the bootstrap search path.
    pub bootstrap_archives: Vec<PathBuf>,
    /// Agent library paths.
    pub lib_paths: Vec<PathBuf>,
    /// Shared services.
    pub services: ServiceHandles,
}

/// Builds an agent from its options.
pub type AgentFactory = Arc<dyn Fn(AgentOption) -> BootResult<Box<dyn Agent>> + Send + Sync>;

/// Bootable agent implementations, keyed by boot class name.
#[derive(Clone, Default)]
pub struct EntryPoints {
    factories: HashMap<String, AgentFactory>,
}

impl EntryPoints {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `boot_class`, replacing any previous one.
    #[must_use]
    pub fn with<F>(mut self, boot_class: &str, factory: F) -> Self
    where
        F: Fn(AgentOption) -> BootResult<Box<dyn Agent>> + Send + Sync + 'static,
    {
        self.factories
            .insert(boot_class.to_string(), Arc::new(factory));
        self
    }

    /// Look up the factory for `boot_class`.
    #[must_use]
    pub fn get(&self, boot_class: &str) -> Option<&AgentFactory> {
        self.factories.get(boot_class)
    }

    /// Whether `boot_class` is registered.
    #[must_use]
    pub fn contains(&self, boot_class: &str) -> bool {
        self.factories.contains_key(boot_class)
    }
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("EntryPoints").field("boot_classes", &names).finish()
    }
}

/// Loading context for the agent: its libraries and the boot class to
/// start.
#[derive(Debug)]
pub struct AgentClassLoader {
    libs: Vec<PathBuf>,
    entry_points: EntryPoints,
    boot_class: Option<String>,
}

impl AgentClassLoader {
    /// Create a loader over `libs`.
    #[must_use]
    pub fn new(libs: Vec<PathBuf>, entry_points: EntryPoints) -> Self {
        Self {
            libs,
            entry_points,
            boot_class: None,
        }
    }

    /// Select the class to boot.
    pub fn set_boot_class(&mut self, boot_class: impl Into<String>) {
        self.boot_class = Some(boot_class.into());
    }

    /// The selected boot class.
    #[must_use]
    pub fn boot_class(&self) -> Option<&str> {
        self.boot_class.as_deref()
    }

    /// The library paths.
    #[must_use]
    pub fn libs(&self) -> &[PathBuf] {
        &self.libs
    }

    /// Instantiate the boot class.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::BootClassNotFound`] if no boot class is selected
    /// or it has no entry point, or whatever the entry point returns.
    pub fn boot(&self, option: AgentOption) -> BootResult<Box<dyn Agent>> {
        let boot_class = self
            .boot_class
            .as_deref()
            .ok_or_else(|| BootError::BootClassNotFound("<unset>".to_string()))?;
        let factory = self
            .entry_points
            .get(boot_class)
            .ok_or_else(|| BootError::BootClassNotFound(boot_class.to_string()))?;
        info!(boot_class, libs = self.libs.len(), "Booting agent");
        factory(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopAgent;

    impl Agent for NoopAgent {
        fn start(&self) -> BootResult<()> {
            Ok(())
        }

        fn stop(&self) {}
    }

    fn option() -> AgentOption {
        AgentOption {
            identity: AgentIdentity {
                agent_id: "web-01".to_string(),
                application_name: "shop".to_string(),
            },
            agent_args: AgentArgs::default(),
            config: Arc::new(Config::default()),
            plugin_archives: Vec::new(),
            bootstrap_archives: Vec::new(),
            lib_paths: Vec::new(),
            services: ServiceHandles::new(),
        }
    }

    #[test]
    fn test_service_handles_by_type() {
        let services = ServiceHandles::new()
            .with(Arc::new(42u32))
            .with(Arc::new("collector".to_string()));
        assert_eq!(services.len(), 2);
        assert_eq!(*services.get::<u32>().unwrap(), 42);
        assert_eq!(services.get::<String>().unwrap().as_str(), "collector");
        assert!(services.get::<u64>().is_none());
    }

    #[test]
    fn test_boot_registered_class() {
        let entry_points =
            EntryPoints::new().with("io.probe.profiler.DefaultAgent", |_| Ok(Box::new(NoopAgent)));
        let mut loader = AgentClassLoader::new(vec![PathBuf::from("/agent/lib")], entry_points);
        loader.set_boot_class("io.probe.profiler.DefaultAgent");
        let agent = loader.boot(option()).unwrap();
        agent.start().unwrap();
    }

    #[test]
    fn test_boot_unknown_class() {
        let mut loader = AgentClassLoader::new(Vec::new(), EntryPoints::new());
        assert!(matches!(
            loader.boot(option()),
            Err(BootError::BootClassNotFound(_))
        ));
        loader.set_boot_class("io.probe.test.PluginTestAgent");
        assert!(matches!(
            loader.boot(option()),
            Err(BootError::BootClassNotFound(name)) if name == "io.probe.test.PluginTestAgent"
        ));
    }
}
