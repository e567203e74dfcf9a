//! Prelude module - commonly used types for convenient import.
//!
//! Use `use probe_bootstrap::prelude::*;` to import all essential types.

// Errors
pub use crate::{BootError, BootResult};

// Entry point
pub use crate::{BootOutcome, ProbeBootstrap};

// Collaborators
pub use crate::{
    Agent, AgentDirClassPathResolver, AgentOption, ClassPathResolver, EntryPoints, HostRuntime,
    ProcessRuntime, ServiceHandles,
};
