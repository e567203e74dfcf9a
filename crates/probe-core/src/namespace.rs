//! The agent's reserved namespace and the well-known names plugins use.
//!
//! Every class under one of [`RESERVED_PACKAGES`] belongs to the agent's own
//! machinery. Plugins must never be asked to intercept those classes, or the
//! agent would end up instrumenting itself.
//!
//! First-party plugins live under [`DEFAULT_PLUGIN_PACKAGE`], which is
//! deliberately outside the reserved set.

/// Root of every name the agent owns.
pub const ROOT_PACKAGE: &str = "io.probe";

/// Internal package prefixes that no plugin may touch.
pub const RESERVED_PACKAGES: &[&str] = &[
    "io.probe.bootstrap",
    "io.probe.profiler",
    "io.probe.common",
    "io.probe.rpc",
    "io.probe.exception",
    "io.probe.loader",
];

/// Package scope granted to an archive whose manifest declares none.
pub const DEFAULT_PLUGIN_PACKAGE: &str = "io.probe.plugin";

/// Fully-qualified name of the extension interface plugins implement.
///
/// Also the file name of the service descriptor inside each archive.
pub const PLUGIN_SERVICE_INTERFACE: &str = "io.probe.bootstrap.plugin.ProfilerPlugin";

/// Manifest attribute listing the packages a plugin archive may act on.
pub const PLUGIN_PACKAGE_ATTRIBUTE: &str = "Probe-Plugin-Package";

/// Returns `true` if `class_name` falls under one of the reserved packages.
#[must_use]
pub fn is_reserved(class_name: &str) -> bool {
    RESERVED_PACKAGES
        .iter()
        .any(|package| class_name.starts_with(package))
}
