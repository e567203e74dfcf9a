//! Probe Agent - runs the Probe instrumentation agent in-process.
//!
//! Resolves an agent home, sets up file logging under `<home>/log`, runs the
//! bootstrap against an in-process host runtime and keeps the agent running
//! until interrupted, then runs the registered shutdown hooks.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use probe_bootstrap::{
    AgentDirClassPathResolver, BootOutcome, ClassPathResolver, HostRuntime, ProbeBootstrap,
    ProcessRuntime, ServiceHandles,
};
use probe_config::Config;
use probe_core::{ProductInfo, PropertySource, SystemProperties, properties};
use probe_plugins::PluginCatalog;
use probe_telemetry::{LogConfig, setup_logging};
use tracing::info;

mod agent;

use agent::ProfilerAgent;

/// Log file name prefix.
const LOG_FILE_PREFIX: &str = "probe-agent";

/// Probe Agent - instrumentation agent bootstrap
#[derive(Parser, Debug)]
#[command(name = "probe-agent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Agent home directory
    #[arg(long, env = "PROBE_HOME")]
    agent_home: PathBuf,

    /// Agent arguments, e.g. `agentId=web-01,applicationName=shop`
    #[arg(long)]
    agent_args: Option<String>,

    /// Configuration file, overriding `<agent home>/probe.toml`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log to stderr instead of the agent home's log directory
    #[arg(long)]
    log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let props = Arc::new(SystemProperties::from_env());
    if let Some(config) = &cli.config {
        props.set(properties::CONFIG_PATH, &config.display().to_string());
    }

    let resolver = AgentDirClassPathResolver::new(&cli.agent_home);
    let log_config = log_config(&resolver, props.as_ref(), cli.log_stderr);
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
    info!(
        version = ProductInfo::VERSION,
        home = %cli.agent_home.display(),
        "{} starting",
        ProductInfo::NAME
    );

    // No plugin types are compiled in, so plugin archives are only verified.
    let bootstrap = ProbeBootstrap::new(Arc::new(resolver), props)
        .with_entry_points(ProfilerAgent::entry_points())
        .with_services(ServiceHandles::new().with(Arc::new(PluginCatalog::new())));
    let host = Arc::new(ProcessRuntime::new());

    let outcome = bootstrap.premain(
        cli.agent_args.as_deref(),
        Arc::clone(&host) as Arc<dyn HostRuntime>,
    );
    match outcome {
        BootOutcome::Started => {},
        BootOutcome::AlreadyStarted => return Ok(()),
        BootOutcome::Failed => bail!("{} failed to load", ProductInfo::NAME),
    }

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, shutting down");
    let hooks = tokio::task::spawn_blocking(move || host.run_shutdown_hooks()).await?;
    info!(hooks, "{} exited", ProductInfo::NAME);
    Ok(())
}

/// Logging settings for this run.
///
/// Reads the `[logging]` table of whichever configuration the bootstrap will
/// use. Any problem with it falls back to the defaults; the bootstrap reports
/// configuration errors itself.
fn log_config(
    resolver: &dyn ClassPathResolver,
    props: &dyn PropertySource,
    log_stderr: bool,
) -> LogConfig {
    let config_path = props
        .get(properties::CONFIG_PATH)
        .map(PathBuf::from)
        .or_else(|| resolver.agent_config_path());
    let base = config_path
        .as_deref()
        .and_then(logging_section)
        .unwrap_or_default()
        .with_thread_names();

    if log_stderr {
        base
    } else {
        base.with_file_logging(resolver.agent_log_file_path(), LOG_FILE_PREFIX)
    }
}

fn logging_section(path: &Path) -> Option<LogConfig> {
    let config = Config::load_file(path).ok()?;
    match LogConfig::from_section(&config.logging) {
        Ok(log_config) => Some(log_config),
        Err(e) => {
            // Logging is not up yet.
            eprintln!("Ignoring [logging] section of {}: {e}", path.display());
            None
        },
    }
}
