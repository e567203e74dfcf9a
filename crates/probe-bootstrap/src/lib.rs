//! Probe Bootstrap - Single-shot startup sequencing for the Probe agent.
//!
//! [`ProbeBootstrap::premain`] is the agent's entry point. It:
//!
//! 1. Passes the [`LoadState`] gate (at most once per bootstrap instance)
//! 2. Parses the [`AgentArgs`]
//! 3. Verifies the agent home through a [`ClassPathResolver`]
//! 4. Hands over to the [`ProbeStarter`], which resolves the identity and
//!    configuration, boots the agent selected by the arguments and registers
//!    its shutdown hook with the [`HostRuntime`]
//!
//! Failures never escape: they are logged, a banner is printed to stderr and
//! [`BootOutcome::Failed`] is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use probe_bootstrap::{AgentDirClassPathResolver, ProbeBootstrap, ProcessRuntime};
//! use probe_core::SystemProperties;
//!
//! let bootstrap = ProbeBootstrap::new(
//!     Arc::new(AgentDirClassPathResolver::new("/opt/probe")),
//!     Arc::new(SystemProperties::from_env()),
//! );
//! let host = Arc::new(ProcessRuntime::new());
//! let outcome = bootstrap.premain(Some("agentId=web-01"), host.clone());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod agent;
pub mod args;
pub mod classpath;
pub mod error;
pub mod host;
pub mod identity;
pub mod starter;
pub mod state;

use std::sync::Arc;

use probe_core::{ProductInfo, PropertySource};
use tracing::{info, warn};

pub use agent::{Agent, AgentClassLoader, AgentFactory, AgentOption, EntryPoints, ServiceHandles};
pub use args::{AgentArgs, AgentType};
pub use classpath::{AgentDirClassPathResolver, ClassPathResolver};
pub use error::{BootError, BootResult};
pub use host::{HostRuntime, ProcessRuntime, ShutdownHook};
pub use identity::{AgentIdentity, IdValidator};
pub use starter::ProbeStarter;
pub use state::LoadState;

/// How a [`ProbeBootstrap::premain`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// The agent started.
    Started,
    /// Another call already passed the gate; nothing was done.
    AlreadyStarted,
    /// The agent failed to load.
    Failed,
}

/// Owns the load gate and the collaborators needed to start the agent.
pub struct ProbeBootstrap {
    state: LoadState,
    resolver: Arc<dyn ClassPathResolver>,
    properties: Arc<dyn PropertySource>,
    entry_points: EntryPoints,
    services: ServiceHandles,
}

impl ProbeBootstrap {
    /// Create a bootstrap in the not-started state.
    #[must_use]
    pub fn new(resolver: Arc<dyn ClassPathResolver>, properties: Arc<dyn PropertySource>) -> Self {
        Self {
            state: LoadState::new(),
            resolver,
            properties,
            entry_points: EntryPoints::new(),
            services: ServiceHandles::new(),
        }
    }

    /// Set the bootable agent implementations.
    #[must_use]
    pub fn with_entry_points(mut self, entry_points: EntryPoints) -> Self {
        self.entry_points = entry_points;
        self
    }

    /// Set the services handed to the agent.
    #[must_use]
    pub fn with_services(mut self, services: ServiceHandles) -> Self {
        self.services = services;
        self
    }

    /// Whether a call has passed the gate.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Load the agent.
    ///
    /// Only the first call does anything; later or concurrent calls return
    /// [`BootOutcome::AlreadyStarted`] immediately.
    pub fn premain(&self, agent_args: Option<&str>, host: Arc<dyn HostRuntime>) -> BootOutcome {
        let agent_args = agent_args.unwrap_or_default();
        info!(agent_args, "{} agent args", ProductInfo::NAME);

        if !self.state.start() {
            warn!("{}-bootstrap already started, skipping agent loading", ProductInfo::NAME);
            return BootOutcome::AlreadyStarted;
        }

        let args = AgentArgs::parse(agent_args);
        if !args.is_empty() {
            info!(args = %args, "Agent parameters");
        }

        if let Err(e) = self.resolver.verify() {
            warn!(error = %e, "Agent directory verification failed, skipping agent loading");
            log_load_failure();
            return BootOutcome::Failed;
        }

        let starter = ProbeStarter::new(
            args,
            Arc::clone(&self.resolver),
            host,
            Arc::clone(&self.properties),
            self.entry_points.clone(),
            self.services.clone(),
        );
        if starter.start() {
            BootOutcome::Started
        } else {
            log_load_failure();
            BootOutcome::Failed
        }
    }
}

impl std::fmt::Debug for ProbeBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeBootstrap")
            .field("state", &self.state)
            .field("home", &self.resolver.agent_home())
            .field("entry_points", &self.entry_points)
            .finish_non_exhaustive()
    }
}

/// The banner printed to stderr when the agent fails to load.
#[must_use]
pub fn failure_banner() -> String {
    let rule = "*".repeat(77);
    format!("{rule}\n* Probe Agent load failure\n{rule}")
}

fn log_load_failure() {
    eprintln!("{}", failure_banner());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_banner() {
        let banner = failure_banner();
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "* Probe Agent load failure");
        assert!(lines[0].chars().all(|c| c == '*'));
    }
}
