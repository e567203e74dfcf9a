//! Prelude module - commonly used test utilities.
//!
//! Use `use probe_test::prelude::*;` to import all helpers.

pub use crate::{
    LogCapture, MockHostRuntime, PluginArchiveBuilder, RecordingAgent, RecordingSetup,
    TestAgentHome, TransformingPlugin,
};
