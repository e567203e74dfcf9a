//! Agent home scaffolding.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::archive::PluginArchiveBuilder;

/// Minimal configuration written by [`TestAgentHome::new`].
pub const TEST_CONFIG: &str = "[profiler]\ncollector_host = \"127.0.0.1\"\n";

/// A temporary agent home with a valid layout.
///
/// Contains the bootstrap archive, the required boot archives, empty `lib/`,
/// `plugin/` and `log/` directories and a minimal `probe.toml`. Removed on
/// drop.
#[derive(Debug)]
pub struct TestAgentHome {
    dir: TempDir,
}

impl TestAgentHome {
    /// Scaffold a complete agent home.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let home = Self {
            dir: tempfile::tempdir().expect("create agent home"),
        };
        let empty = PluginArchiveBuilder::new().manifest_attribute("Manifest-Version", "1.0");
        let _ = empty.write_to(home.path(), "probe-bootstrap-0.1.1.tgz");
        let _ = empty.write_to(&home.path().join("boot"), "probe-commons-0.1.1.tgz");
        let _ = empty.write_to(&home.path().join("boot"), "probe-bootstrap-core-0.1.1.tgz");
        for dir in ["lib", "plugin", "log"] {
            std::fs::create_dir_all(home.path().join(dir)).expect("create agent home directory");
        }
        home.with_config(TEST_CONFIG)
    }

    /// The agent home directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file or directory relative to the home.
    #[must_use]
    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Replace `probe.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn with_config(self, toml: &str) -> Self {
        std::fs::write(self.join("probe.toml"), toml).expect("write probe.toml");
        self
    }

    /// Remove `probe.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be removed.
    #[must_use]
    pub fn without_config(self) -> Self {
        std::fs::remove_file(self.join("probe.toml")).expect("remove probe.toml");
        self
    }

    /// Add a plugin archive to `plugin/`.
    #[must_use]
    pub fn with_plugin(self, file_name: &str, archive: &PluginArchiveBuilder) -> Self {
        let _ = archive.write_to(&self.join("plugin"), file_name);
        self
    }

    /// Add a file to `lib/`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn with_lib(self, file_name: &str, contents: &[u8]) -> Self {
        std::fs::write(self.join("lib").join(file_name), contents).expect("write library");
        self
    }

    /// Remove a file relative to the home.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be removed.
    #[must_use]
    pub fn without(self, relative: &str) -> Self {
        std::fs::remove_file(self.join(relative)).expect("remove file");
        self
    }
}

impl Default for TestAgentHome {
    fn default() -> Self {
        Self::new()
    }
}
