//! Mock implementations for testing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use probe_bootstrap::{
    Agent, AgentOption, AgentType, BootError, BootResult, EntryPoints, HostRuntime, ShutdownHook,
};
use probe_plugins::{
    ArchiveClassInjector, DefaultPluginSetup, PluginError, PluginResult, PluginSetup,
    PluginSetupContext, ProfilerPlugin, SetupResult,
};

/// A plugin that registers a fixed set of transformers.
#[derive(Debug, Clone, Default)]
pub struct TransformingPlugin {
    transformers: Vec<(String, String)>,
    helpers: Vec<String>,
}

impl TransformingPlugin {
    /// A plugin that registers nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` through `interceptor` during setup.
    #[must_use]
    pub fn with_transformer(mut self, target: &str, interceptor: &str) -> Self {
        self.transformers
            .push((target.to_string(), interceptor.to_string()));
        self
    }

    /// Inject `class_name` during setup.
    #[must_use]
    pub fn with_helper(mut self, class_name: &str) -> Self {
        self.helpers.push(class_name.to_string());
        self
    }
}

impl ProfilerPlugin for TransformingPlugin {
    fn setup(&self, context: &mut PluginSetupContext<'_>) -> PluginResult<()> {
        for (target, interceptor) in &self.transformers {
            context.add_transformer(target, interceptor)?;
        }
        for helper in &self.helpers {
            context.inject_class(helper)?;
        }
        Ok(())
    }
}

/// A plugin whose setup always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingPlugin;

impl ProfilerPlugin for FailingPlugin {
    fn setup(&self, context: &mut PluginSetupContext<'_>) -> PluginResult<()> {
        Err(PluginError::SetupFailed {
            plugin: context.injector().plugin_type().to_string(),
            message: "configured to fail".to_string(),
        })
    }
}

/// A [`PluginSetup`] that records every call before delegating to
/// [`DefaultPluginSetup`].
#[derive(Debug, Default)]
pub struct RecordingSetup {
    calls: Mutex<Vec<String>>,
    delete_archive_after: Mutex<Vec<String>>,
}

impl RecordingSetup {
    /// Create a recording setup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete the plugin's archive from disk once `type_name` is set up.
    #[must_use]
    pub fn delete_archive_after(self, type_name: &str) -> Self {
        self.delete_archive_after
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(type_name.to_string());
        self
    }

    /// Plugin types handed to the setup, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PluginSetup for RecordingSetup {
    fn setup_plugin(
        &self,
        plugin: &dyn ProfilerPlugin,
        injector: Arc<ArchiveClassInjector>,
    ) -> PluginResult<SetupResult> {
        let type_name = injector.plugin_type().to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(type_name.clone());

        let archive = injector.archive().path().to_path_buf();
        let result = DefaultPluginSetup::new().setup_plugin(plugin, injector);

        let delete = self
            .delete_archive_after
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&type_name);
        if delete {
            let _ = std::fs::remove_file(&archive);
        }
        result
    }
}

/// Mock [`HostRuntime`] that records what it is asked to do.
#[derive(Default)]
pub struct MockHostRuntime {
    appended: Mutex<Vec<PathBuf>>,
    hooks: Mutex<Vec<ShutdownHook>>,
    hooks_registered: AtomicUsize,
}

impl MockHostRuntime {
    /// Create a mock runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives appended to the bootstrap search path, in order.
    #[must_use]
    pub fn appended(&self) -> Vec<PathBuf> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of hooks ever registered.
    #[must_use]
    pub fn hooks_registered(&self) -> usize {
        self.hooks_registered.load(Ordering::SeqCst)
    }

    /// Run and drain the registered hooks on the calling thread.
    pub fn run_shutdown_hooks(&self) -> usize {
        let hooks: Vec<ShutdownHook> =
            std::mem::take(&mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        let count = hooks.len();
        for hook in hooks {
            hook();
        }
        count
    }
}

impl HostRuntime for MockHostRuntime {
    fn append_to_bootstrap_search(&self, archive: &Path) -> BootResult<()> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(archive.to_path_buf());
        Ok(())
    }

    fn add_shutdown_hook(&self, hook: ShutdownHook) {
        self.hooks_registered.fetch_add(1, Ordering::SeqCst);
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }
}

impl std::fmt::Debug for MockHostRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHostRuntime")
            .field("appended", &self.appended())
            .field("hooks_registered", &self.hooks_registered())
            .finish()
    }
}

/// How a [`RecordingAgent`] behaves when started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartBehavior {
    /// Start succeeds.
    #[default]
    Succeed,
    /// Start returns an error.
    Fail,
    /// Start panics.
    Panic,
}

/// Everything that happened to agents booted through
/// [`RecordingAgent::entry_points`].
#[derive(Debug, Default)]
pub struct AgentCalls {
    starts: AtomicUsize,
    stops: AtomicUsize,
    boots: Mutex<Vec<(String, AgentOption)>>,
}

impl AgentCalls {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `start` calls.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of `stop` calls.
    #[must_use]
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Boot classes booted, in order.
    #[must_use]
    pub fn boot_classes(&self) -> Vec<String> {
        self.boots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(class, _)| class.clone())
            .collect()
    }

    /// The option of the most recent boot.
    #[must_use]
    pub fn last_option(&self) -> Option<AgentOption> {
        self.boots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|(_, option)| option.clone())
    }
}

/// An agent that records its lifecycle into [`AgentCalls`].
#[derive(Debug)]
pub struct RecordingAgent {
    calls: Arc<AgentCalls>,
    behavior: StartBehavior,
}

impl RecordingAgent {
    /// Entry points for both boot classes, each producing a recording agent.
    #[must_use]
    pub fn entry_points(calls: &Arc<AgentCalls>, behavior: StartBehavior) -> EntryPoints {
        [
            AgentType::DEFAULT_BOOT_CLASS,
            AgentType::PLUGIN_TEST_BOOT_CLASS,
        ]
        .into_iter()
        .fold(EntryPoints::new(), |entry_points, boot_class| {
            let calls = Arc::clone(calls);
            entry_points.with(boot_class, move |option| {
                calls
                    .boots
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((boot_class.to_string(), option));
                Ok(Box::new(RecordingAgent {
                    calls: Arc::clone(&calls),
                    behavior,
                }))
            })
        })
    }
}

impl Agent for RecordingAgent {
    fn start(&self) -> BootResult<()> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            StartBehavior::Succeed => Ok(()),
            StartBehavior::Fail => Err(BootError::AgentStart("configured to fail".to_string())),
            StartBehavior::Panic => panic!("recording agent configured to panic"),
        }
    }

    fn stop(&self) {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
    }
}
