//! The starter: everything between a passed gate and a running agent.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use probe_config::Config;
use probe_core::{ProductInfo, PropertySource, properties};
use tracing::{error, info, warn};

use crate::agent::{Agent, AgentClassLoader, AgentOption, EntryPoints, ServiceHandles};
use crate::args::AgentArgs;
use crate::classpath::ClassPathResolver;
use crate::error::{BootError, BootResult};
use crate::host::HostRuntime;
use crate::identity::{AgentIdentity, IdValidator};

/// Library path fragment that marks test-only libraries.
pub const TEST_LIBRARY_MARKER: &str = "probe-profiler-test";

/// Resolves identity, configuration and libraries, then boots and starts
/// the agent.
pub struct ProbeStarter {
    args: AgentArgs,
    resolver: Arc<dyn ClassPathResolver>,
    host: Arc<dyn HostRuntime>,
    properties: Arc<dyn PropertySource>,
    entry_points: EntryPoints,
    services: ServiceHandles,
}

impl ProbeStarter {
    /// Create a starter.
    #[must_use]
    pub fn new(
        args: AgentArgs,
        resolver: Arc<dyn ClassPathResolver>,
        host: Arc<dyn HostRuntime>,
        properties: Arc<dyn PropertySource>,
        entry_points: EntryPoints,
        services: ServiceHandles,
    ) -> Self {
        Self {
            args,
            resolver,
            host,
            properties,
            entry_points,
            services,
        }
    }

    /// Start the agent.
    ///
    /// Returns `false` if the identity is incomplete, no configuration is
    /// found, or anything after that fails or panics. Nothing is read from
    /// the agent home before the identity is resolved.
    #[must_use]
    pub fn start(self) -> bool {
        let identity = match IdValidator::new(&self.args, self.properties.as_ref()).validate() {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Agent identity unresolved");
                return false;
            },
        };

        match panic::catch_unwind(AssertUnwindSafe(move || self.boot(identity))) {
            Ok(Ok(())) => {
                info!("{} agent started normally", ProductInfo::NAME);
                true
            },
            Ok(Err(e)) => {
                warn!(error = %e, "{} start failed", ProductInfo::NAME);
                false
            },
            Err(payload) => {
                error!(
                    panic = %panic_message(payload.as_ref()),
                    "{} start panicked",
                    ProductInfo::NAME
                );
                false
            },
        }
    }

    fn boot(self, identity: AgentIdentity) -> BootResult<()> {
        let plugin_archives = self.resolver.resolve_plugins()?;

        let config_path = self.config_path().ok_or(BootError::ConfigNotFound)?;
        self.save_log_path();
        self.save_version();
        let config = Config::load_file(&config_path)?;

        let bootstrap_archives = self.resolver.bootstrap_archives()?;
        for archive in &bootstrap_archives {
            info!(archive = %archive.display(), "Appending to bootstrap search path");
            self.host.append_to_bootstrap_search(archive)?;
        }

        let lib_paths = self.resolve_lib()?;
        let mut loader = AgentClassLoader::new(lib_paths.clone(), self.entry_points);
        let boot_class = self.args.agent_type().boot_class();
        loader.set_boot_class(boot_class);
        info!(boot_class, "{} agent starting", ProductInfo::NAME);

        let option = AgentOption {
            identity,
            agent_args: self.args,
            config: Arc::new(config),
            plugin_archives,
            bootstrap_archives,
            lib_paths,
            services: self.services,
        };
        let agent: Arc<dyn Agent> = Arc::from(loader.boot(option)?);
        agent.start()?;

        self.host.add_shutdown_hook(Box::new(move || {
            info!("Stopping {} agent", ProductInfo::NAME);
            agent.stop();
        }));
        Ok(())
    }

    /// `PROBE_CONFIG` verbatim if set, else the agent home's config file.
    fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.properties.get(properties::CONFIG_PATH) {
            info!(property = properties::CONFIG_PATH, path = %path, "Using configuration override");
            return Some(PathBuf::from(path));
        }
        if let Some(path) = self.resolver.agent_config_path() {
            info!(path = %path.display(), "Using agent home configuration");
            return Some(path);
        }
        warn!(
            property = properties::CONFIG_PATH,
            home = %self.resolver.agent_home().display(),
            "Configuration file not found"
        );
        None
    }

    fn save_log_path(&self) {
        let log_path = self.resolver.agent_log_file_path();
        let log_path = log_path.display().to_string();
        info!(path = %log_path, "Agent log path");
        self.properties.set(properties::LOG_PATH, &log_path);
    }

    fn save_version(&self) {
        info!(version = ProductInfo::VERSION, "{} version", ProductInfo::NAME);
        self.properties.set(properties::VERSION, ProductInfo::VERSION);
    }

    fn resolve_lib(&self) -> BootResult<Vec<PathBuf>> {
        let libs = self.resolver.resolve_lib()?;
        let libs = filter_libraries(libs, self.args.agent_type().loads_test_libraries());
        info!(
            jar = ?self.resolver.agent_jar_path(),
            lib_dir = %self.resolver.agent_lib_path().display(),
            config = ?self.resolver.agent_config_path(),
            "Resolved agent libraries"
        );
        for lib in &libs {
            info!(lib = %lib.display(), "Agent library");
        }
        Ok(libs)
    }
}

impl std::fmt::Debug for ProbeStarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeStarter")
            .field("args", &self.args)
            .field("home", &self.resolver.agent_home())
            .field("entry_points", &self.entry_points)
            .finish_non_exhaustive()
    }
}

/// Drop test-only libraries unless they are wanted.
#[must_use]
pub fn filter_libraries(libs: Vec<PathBuf>, include_test_libraries: bool) -> Vec<PathBuf> {
    if include_test_libraries {
        info!("Loading plugin test libraries");
        return libs;
    }
    libs.into_iter()
        .filter(|lib| !lib.to_string_lossy().contains(TEST_LIBRARY_MARKER))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
