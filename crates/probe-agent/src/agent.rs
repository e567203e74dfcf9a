//! The agents this binary can boot.
//!
//! Both boot classes map to [`ProfilerAgent`]; the plugin test agent only
//! differs in how loudly it reports what each plugin registered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use probe_bootstrap::{Agent, AgentOption, AgentType, BootResult, EntryPoints};
use probe_plugins::{
    DefaultPluginSetup, DisabledPlugins, PluginCatalog, ProfilerPluginLoader, SetupResult,
};
use tracing::{debug, info, warn};

/// Loads the plugin archives it was booted with on start.
///
/// Plugin types are instantiated from the [`PluginCatalog`] found in the
/// option's service handles. The `probe-agent` binary compiles in no plugin
/// types, so on its own it only verifies archives: manifests and descriptors
/// are read and scoped, and every archive that lists a provider is skipped.
/// Embedders register their factories in the catalog they pass as a service.
pub(crate) struct ProfilerAgent {
    agent_type: AgentType,
    option: AgentOption,
    running: AtomicBool,
    loaded: Mutex<Vec<SetupResult>>,
}

impl ProfilerAgent {
    pub(crate) fn new(agent_type: AgentType, option: AgentOption) -> Self {
        Self {
            agent_type,
            option,
            running: AtomicBool::new(false),
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// Entry points for both boot classes.
    pub(crate) fn entry_points() -> EntryPoints {
        [AgentType::Default, AgentType::PluginTest]
            .into_iter()
            .fold(EntryPoints::new(), |entry_points, agent_type| {
                entry_points.with(agent_type.boot_class(), move |option| {
                    Ok(Box::new(ProfilerAgent::new(agent_type, option)))
                })
            })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Setup results of the last successful start.
    pub(crate) fn loaded(&self) -> Vec<SetupResult> {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn catalog(&self) -> Arc<PluginCatalog> {
        let catalog = self
            .option
            .services
            .get::<PluginCatalog>()
            .unwrap_or_else(|| Arc::new(PluginCatalog::new()));
        if catalog.is_empty() && !self.option.plugin_archives.is_empty() {
            warn!(
                archives = self.option.plugin_archives.len(),
                "No plugin types registered, plugin archives are only verified"
            );
        }
        catalog
    }

    fn report(&self, results: &[SetupResult]) {
        for result in results {
            if self.agent_type == AgentType::PluginTest {
                for transformer in &result.transformers {
                    info!(
                        plugin = %result.plugin_type,
                        target = %transformer.target,
                        interceptor = %transformer.interceptor,
                        "Plugin transformer"
                    );
                }
            } else {
                debug!(
                    plugin = %result.plugin_type,
                    archive = %result.archive,
                    transformers = result.transformers.len(),
                    "Plugin ready"
                );
            }
        }
    }
}

impl Agent for ProfilerAgent {
    fn start(&self) -> BootResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Agent already running");
            return Ok(());
        }

        let loader = ProfilerPluginLoader::new(
            DisabledPlugins::from_config(&self.option.config),
            Arc::new(DefaultPluginSetup::new()),
            self.catalog(),
        );
        let results = match loader.load(&self.option.plugin_archives) {
            Ok(results) => results,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            },
        };

        self.report(&results);
        info!(
            agent_id = %self.option.identity.agent_id,
            application = %self.option.identity.application_name,
            boot_class = self.agent_type.boot_class(),
            archives = self.option.plugin_archives.len(),
            plugins = results.len(),
            "Agent running"
        );
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = results;
        Ok(())
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let released = std::mem::take(
            &mut *self.loaded.lock().unwrap_or_else(PoisonError::into_inner),
        );
        info!(plugins = released.len(), "Agent stopped");
    }
}

impl std::fmt::Debug for ProfilerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilerAgent")
            .field("agent_type", &self.agent_type)
            .field("identity", &self.option.identity)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use probe_bootstrap::{AgentArgs, AgentIdentity, ServiceHandles};
    use probe_config::Config;
    use probe_plugins::ArchiveRef;
    use probe_test::{LogCapture, PluginArchiveBuilder, TransformingPlugin};

    use super::*;

    fn option(archives: Vec<ArchiveRef>, config: Config, services: ServiceHandles) -> AgentOption {
        AgentOption {
            identity: AgentIdentity {
                agent_id: "web-01".to_string(),
                application_name: "shop".to_string(),
            },
            agent_args: AgentArgs::parse(""),
            config: Arc::new(config),
            plugin_archives: archives,
            bootstrap_archives: Vec::new(),
            lib_paths: Vec::new(),
            services,
        }
    }

    fn catalog() -> ServiceHandles {
        let mut catalog = PluginCatalog::new();
        catalog
            .register("com.example.HttpPlugin", || {
                Box::new(
                    TransformingPlugin::new()
                        .with_transformer("org.http.Client", "com.example.HttpInterceptor"),
                )
            })
            .unwrap();
        catalog
            .register("com.example.RedisPlugin", || Box::new(TransformingPlugin::new()))
            .unwrap();
        ServiceHandles::new().with(Arc::new(catalog))
    }

    fn archive(dir: &Path) -> ArchiveRef {
        PluginArchiveBuilder::new()
            .packages("com.example")
            .plugin("com.example.HttpPlugin")
            .plugin("com.example.RedisPlugin")
            .class("com.example.HttpInterceptor", b"interceptor")
            .write_to(dir, "example-plugin.tgz")
            .into()
    }

    #[test]
    fn test_entry_points_cover_both_boot_classes() {
        let entry_points = ProfilerAgent::entry_points();
        assert!(entry_points.contains(AgentType::DEFAULT_BOOT_CLASS));
        assert!(entry_points.contains(AgentType::PLUGIN_TEST_BOOT_CLASS));
    }

    #[test]
    fn test_start_loads_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ProfilerAgent::new(
            AgentType::Default,
            option(vec![archive(dir.path())], Config::default(), catalog()),
        );

        agent.start().unwrap();
        assert!(agent.is_running());
        let loaded = agent.loaded();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].plugin_type.as_str(), "com.example.HttpPlugin");
        assert_eq!(loaded[0].transformers.len(), 1);
        assert_eq!(loaded[1].plugin_type.as_str(), "com.example.RedisPlugin");
    }

    #[test]
    fn test_start_honors_disabled_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::from_toml_str("[plugins]\ndisabled = [\"com.example.RedisPlugin\"]\n").unwrap();
        let agent = ProfilerAgent::new(
            AgentType::PluginTest,
            option(vec![archive(dir.path())], config, catalog()),
        );

        agent.start().unwrap();
        let loaded = agent.loaded();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].plugin_type.as_str(), "com.example.HttpPlugin");
    }

    #[test]
    fn test_start_without_catalog_skips_archives() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ProfilerAgent::new(
            AgentType::Default,
            option(vec![archive(dir.path())], Config::default(), ServiceHandles::new()),
        );
        let capture = LogCapture::new();

        capture.run(|| agent.start()).unwrap();
        assert!(agent.loaded().is_empty());
        assert_eq!(capture.count("plugin archives are only verified"), 1);
    }

    #[test]
    fn test_empty_catalog_without_archives_is_quiet() {
        let agent = ProfilerAgent::new(
            AgentType::Default,
            option(
                Vec::new(),
                Config::default(),
                ServiceHandles::new().with(Arc::new(PluginCatalog::new())),
            ),
        );
        let capture = LogCapture::new();

        capture.run(|| agent.start()).unwrap();
        assert_eq!(capture.count("only verified"), 0);
    }

    #[test]
    fn test_unopenable_archive_fails_start() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ArchiveRef::new(dir.path().join("missing.tgz"));
        let agent = ProfilerAgent::new(
            AgentType::Default,
            option(vec![missing], Config::default(), catalog()),
        );

        assert!(agent.start().is_err());
        assert!(!agent.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ProfilerAgent::new(
            AgentType::Default,
            option(vec![archive(dir.path())], Config::default(), catalog()),
        );
        agent.start().unwrap();

        agent.stop();
        assert!(!agent.is_running());
        assert!(agent.loaded().is_empty());
        agent.stop();
        assert!(!agent.is_running());
    }
}
