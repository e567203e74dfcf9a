//! Bootstrap sequencing against a scaffolded agent home.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use probe_bootstrap::prelude::*;
use probe_core::{MapProperties, PropertySource, properties};
use probe_plugins::ArchiveRef;
use probe_test::{
    AgentCalls, MockHostRuntime, PluginArchiveBuilder, RecordingAgent, StartBehavior,
    TestAgentHome,
};

fn identity() -> Arc<MapProperties> {
    Arc::new(
        MapProperties::new()
            .with(properties::AGENT_ID, "web-01")
            .with(properties::APPLICATION_NAME, "shop"),
    )
}

fn bootstrap(
    resolver: Arc<dyn ClassPathResolver>,
    props: Arc<dyn PropertySource>,
    calls: &Arc<AgentCalls>,
    behavior: StartBehavior,
) -> ProbeBootstrap {
    ProbeBootstrap::new(resolver, props)
        .with_entry_points(RecordingAgent::entry_points(calls, behavior))
}

fn home_bootstrap(home: &TestAgentHome, calls: &Arc<AgentCalls>) -> ProbeBootstrap {
    bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        identity(),
        calls,
        StartBehavior::Succeed,
    )
}

/// Counts every call that reads the agent home's archives.
struct CountingResolver {
    inner: AgentDirClassPathResolver,
    archive_reads: AtomicUsize,
}

impl CountingResolver {
    fn new(home: &Path) -> Self {
        Self {
            inner: AgentDirClassPathResolver::new(home),
            archive_reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.archive_reads.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.archive_reads.fetch_add(1, Ordering::SeqCst);
    }
}

impl ClassPathResolver for CountingResolver {
    fn verify(&self) -> BootResult<()> {
        self.inner.verify()
    }

    fn agent_home(&self) -> &Path {
        self.inner.agent_home()
    }

    fn bootstrap_archives(&self) -> BootResult<Vec<PathBuf>> {
        self.count();
        self.inner.bootstrap_archives()
    }

    fn resolve_plugins(&self) -> BootResult<Vec<ArchiveRef>> {
        self.count();
        self.inner.resolve_plugins()
    }

    fn resolve_lib(&self) -> BootResult<Vec<PathBuf>> {
        self.count();
        self.inner.resolve_lib()
    }

    fn agent_config_path(&self) -> Option<PathBuf> {
        self.inner.agent_config_path()
    }

    fn agent_log_file_path(&self) -> PathBuf {
        self.inner.agent_log_file_path()
    }

    fn agent_jar_path(&self) -> Option<PathBuf> {
        self.inner.agent_jar_path()
    }

    fn agent_lib_path(&self) -> PathBuf {
        self.inner.agent_lib_path()
    }
}

#[test]
fn test_premain_starts_agent() {
    let home = TestAgentHome::new().with_plugin(
        "http-plugin.tgz",
        &PluginArchiveBuilder::new().plugin("com.example.HttpPlugin"),
    );
    let calls = AgentCalls::new();
    let props = identity();
    let bootstrap = bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        Arc::clone(&props) as Arc<dyn PropertySource>,
        &calls,
        StartBehavior::Succeed,
    );
    let host = Arc::new(MockHostRuntime::new());

    let outcome = bootstrap.premain(Some(""), Arc::clone(&host) as Arc<dyn HostRuntime>);
    assert_eq!(outcome, BootOutcome::Started);
    assert!(bootstrap.is_started());

    assert_eq!(calls.starts(), 1);
    assert_eq!(calls.boot_classes(), ["io.probe.profiler.DefaultAgent"]);
    assert_eq!(host.hooks_registered(), 1);
    assert_eq!(
        host.appended(),
        [
            home.join("boot/probe-bootstrap-core-0.1.1.tgz"),
            home.join("boot/probe-commons-0.1.1.tgz"),
        ]
    );

    let option = calls.last_option().unwrap();
    assert_eq!(option.identity.agent_id, "web-01");
    assert_eq!(option.identity.application_name, "shop");
    assert_eq!(option.plugin_archives.len(), 1);
    assert_eq!(option.bootstrap_archives, host.appended());
    assert_eq!(option.lib_paths, [home.join("lib")]);

    assert_eq!(
        props.get(properties::LOG_PATH),
        Some(home.join("log").display().to_string())
    );
    assert_eq!(
        props.get(properties::VERSION).as_deref(),
        Some(env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_second_premain_is_ignored() {
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);
    let host = Arc::new(MockHostRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Started
    );
    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::AlreadyStarted
    );
    assert_eq!(calls.starts(), 1);
    assert_eq!(host.hooks_registered(), 1);
}

#[test]
fn test_concurrent_premain_has_one_winner() {
    const RACERS: usize = 8;
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = Arc::new(home_bootstrap(&home, &calls));
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let bootstrap = Arc::clone(&bootstrap);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                bootstrap.premain(None, Arc::new(MockHostRuntime::new()))
            })
        })
        .collect();
    let outcomes: Vec<BootOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let started = outcomes
        .iter()
        .filter(|o| **o == BootOutcome::Started)
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| **o == BootOutcome::AlreadyStarted)
        .count();
    assert_eq!(started, 1);
    assert_eq!(skipped, RACERS - 1);
    assert_eq!(calls.starts(), 1);
}

#[test]
fn test_config_override_takes_precedence() {
    let home = TestAgentHome::new().with_config("[profiler]\nsampling_rate = 10\n");
    let override_dir = tempfile::tempdir().unwrap();
    let override_path = override_dir.path().join("custom.toml");
    std::fs::write(
        &override_path,
        "[profiler]\nsampling_rate = 5\n\n[plugins]\ndisabled = [\"com.example.RedisPlugin\"]\n",
    )
    .unwrap();

    let props = MapProperties::new()
        .with(properties::AGENT_ID, "web-01")
        .with(properties::APPLICATION_NAME, "shop")
        .with(properties::CONFIG_PATH, &override_path.display().to_string());
    let calls = AgentCalls::new();
    let bootstrap = bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        Arc::new(props),
        &calls,
        StartBehavior::Succeed,
    );

    assert_eq!(
        bootstrap.premain(None, Arc::new(MockHostRuntime::new())),
        BootOutcome::Started
    );
    let config = calls.last_option().unwrap().config;
    assert_eq!(config.profiler.sampling_rate, 5);
    assert_eq!(config.disabled_plugins(), ["com.example.RedisPlugin"]);
}

#[test]
fn test_home_config_used_without_override() {
    let home = TestAgentHome::new().with_config("[profiler]\nsampling_rate = 10\n");
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);

    assert_eq!(
        bootstrap.premain(None, Arc::new(MockHostRuntime::new())),
        BootOutcome::Started
    );
    assert_eq!(calls.last_option().unwrap().config.profiler.sampling_rate, 10);
}

#[test]
fn test_missing_config_fails() {
    let home = TestAgentHome::new().without_config();
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);
    let host = Arc::new(MockHostRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Failed
    );
    assert!(calls.boot_classes().is_empty());
    assert!(host.appended().is_empty());
}

#[test]
fn test_override_pointing_nowhere_fails() {
    let home = TestAgentHome::new();
    let props = MapProperties::new()
        .with(properties::AGENT_ID, "web-01")
        .with(properties::APPLICATION_NAME, "shop")
        .with(properties::CONFIG_PATH, "/nonexistent/probe/custom.toml");
    let calls = AgentCalls::new();
    let bootstrap = bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        Arc::new(props),
        &calls,
        StartBehavior::Succeed,
    );

    assert_eq!(
        bootstrap.premain(None, Arc::new(MockHostRuntime::new())),
        BootOutcome::Failed
    );
    assert!(calls.boot_classes().is_empty());
}

#[test]
fn test_missing_identity_fails_before_archive_io() {
    let home = TestAgentHome::new();
    let resolver = Arc::new(CountingResolver::new(home.path()));
    let props = Arc::new(MapProperties::new().with(properties::AGENT_ID, "web-01"));
    let calls = AgentCalls::new();
    let bootstrap = bootstrap(
        Arc::clone(&resolver) as Arc<dyn ClassPathResolver>,
        props,
        &calls,
        StartBehavior::Succeed,
    );
    let host = Arc::new(MockHostRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Failed
    );
    assert_eq!(resolver.reads(), 0);
    assert!(host.appended().is_empty());
    assert!(calls.boot_classes().is_empty());
}

#[test]
fn test_identity_from_agent_args() {
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        Arc::new(MapProperties::new()),
        &calls,
        StartBehavior::Succeed,
    );

    assert_eq!(
        bootstrap.premain(
            Some("agentId=batch-7,applicationName=billing"),
            Arc::new(MockHostRuntime::new())
        ),
        BootOutcome::Started
    );
    let identity = calls.last_option().unwrap().identity;
    assert_eq!(identity.agent_id, "batch-7");
    assert_eq!(identity.application_name, "billing");
}

#[test]
fn test_invalid_layout_fails() {
    let home = TestAgentHome::new().without("boot/probe-commons-0.1.1.tgz");
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);

    assert_eq!(
        bootstrap.premain(None, Arc::new(MockHostRuntime::new())),
        BootOutcome::Failed
    );
    assert!(bootstrap.is_started());
    assert!(calls.boot_classes().is_empty());
}

#[test]
fn test_test_libraries_excluded_by_default() {
    let home = TestAgentHome::new()
        .with_lib("probe-profiler-0.1.1.tgz", b"")
        .with_lib("probe-profiler-test-0.1.1.tgz", b"");
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);

    assert_eq!(
        bootstrap.premain(None, Arc::new(MockHostRuntime::new())),
        BootOutcome::Started
    );
    let option = calls.last_option().unwrap();
    assert_eq!(
        option.lib_paths,
        [home.join("lib"), home.join("lib/probe-profiler-0.1.1.tgz")]
    );
}

#[test]
fn test_plugin_test_agent_type() {
    let home = TestAgentHome::new()
        .with_lib("probe-profiler-0.1.1.tgz", b"")
        .with_lib("probe-profiler-test-0.1.1.tgz", b"");
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);

    assert_eq!(
        bootstrap.premain(Some("AGENT_TYPE=PLUGIN_TEST"), Arc::new(MockHostRuntime::new())),
        BootOutcome::Started
    );
    assert_eq!(calls.boot_classes(), ["io.probe.test.PluginTestAgent"]);
    assert_eq!(calls.last_option().unwrap().lib_paths.len(), 3);
}

#[test]
fn test_shutdown_hook_stops_agent_once() {
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);
    let host = Arc::new(MockHostRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Started
    );
    assert_eq!(calls.stops(), 0);
    assert_eq!(host.run_shutdown_hooks(), 1);
    assert_eq!(host.run_shutdown_hooks(), 0);
    assert_eq!(calls.stops(), 1);
}

#[test]
fn test_process_runtime_runs_hook_once() {
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = home_bootstrap(&home, &calls);
    let host = Arc::new(ProcessRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Started
    );
    assert_eq!(host.bootstrap_search_path().len(), 2);
    assert_eq!(host.run_shutdown_hooks(), 1);
    assert_eq!(host.run_shutdown_hooks(), 0);
    assert_eq!(calls.stops(), 1);
}

#[test]
fn test_agent_start_error_fails_without_hook() {
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        identity(),
        &calls,
        StartBehavior::Fail,
    );
    let host = Arc::new(MockHostRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Failed
    );
    assert_eq!(calls.starts(), 1);
    assert_eq!(host.hooks_registered(), 0);
}

#[test]
fn test_agent_panic_is_contained() {
    let home = TestAgentHome::new();
    let calls = AgentCalls::new();
    let bootstrap = bootstrap(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        identity(),
        &calls,
        StartBehavior::Panic,
    );
    let host = Arc::new(MockHostRuntime::new());

    assert_eq!(
        bootstrap.premain(None, Arc::clone(&host) as Arc<dyn HostRuntime>),
        BootOutcome::Failed
    );
    assert_eq!(calls.starts(), 1);
    assert_eq!(host.hooks_registered(), 0);
}

#[test]
fn test_missing_boot_class_fails() {
    let home = TestAgentHome::new();
    let bootstrap = ProbeBootstrap::new(
        Arc::new(AgentDirClassPathResolver::new(home.path())),
        identity(),
    );
    assert_eq!(
        bootstrap.premain(None, Arc::new(MockHostRuntime::new())),
        BootOutcome::Failed
    );
}
