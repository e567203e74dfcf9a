//! Agent home layout and class path resolution.
//!
//! ```text
//! <agent home>/
//!   probe-bootstrap-<version>.tgz
//!   probe.toml
//!   boot/   probe-commons-<version>.tgz, probe-bootstrap-core-<version>.tgz
//!   lib/    agent libraries and resources
//!   plugin/ plugin archives
//!   log/    agent logs
//! ```

use std::path::{Path, PathBuf};

use probe_plugins::{ArchiveRef, is_plugin_archive};
use tracing::{debug, warn};

use crate::error::{BootError, BootResult};

/// Boot directory name.
pub const BOOT_DIR: &str = "boot";

/// Library directory name.
pub const LIB_DIR: &str = "lib";

/// Plugin directory name.
pub const PLUGIN_DIR: &str = "plugin";

/// Log directory name.
pub const LOG_DIR: &str = "log";

/// Configuration file name.
pub const CONFIG_FILE: &str = "probe.toml";

/// Prefix of the bootstrap archive at the home root.
pub const BOOTSTRAP_ARCHIVE_PREFIX: &str = "probe-bootstrap";

/// Archive prefixes that must be present in the boot directory.
pub const REQUIRED_BOOT_ARCHIVES: &[&str] = &["probe-commons", "probe-bootstrap-core"];

/// File name suffixes picked up from the library directory.
pub const LIB_EXTENSIONS: &[&str] = &[".tgz", ".tar.gz", ".toml", ".xml", ".properties"];

/// Locates the agent's archives, libraries and configuration.
pub trait ClassPathResolver: Send + Sync {
    /// Check the agent home has everything needed to start.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::LayoutInvalid`] describing what is missing.
    fn verify(&self) -> BootResult<()>;

    /// The agent home directory.
    fn agent_home(&self) -> &Path;

    /// Archives that must be visible to the bootstrap search path.
    ///
    /// # Errors
    ///
    /// Returns an error if the boot directory cannot be read.
    fn bootstrap_archives(&self) -> BootResult<Vec<PathBuf>>;

    /// Plugin archives, in load order.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin directory cannot be read.
    fn resolve_plugins(&self) -> BootResult<Vec<ArchiveRef>>;

    /// Agent library paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the library directory cannot be read.
    fn resolve_lib(&self) -> BootResult<Vec<PathBuf>>;

    /// The default configuration file, if it exists.
    fn agent_config_path(&self) -> Option<PathBuf>;

    /// Directory the agent writes its logs to.
    fn agent_log_file_path(&self) -> PathBuf;

    /// The bootstrap archive at the home root, if present.
    fn agent_jar_path(&self) -> Option<PathBuf>;

    /// The library directory.
    fn agent_lib_path(&self) -> PathBuf;
}

/// [`ClassPathResolver`] over an agent home directory.
#[derive(Debug, Clone)]
pub struct AgentDirClassPathResolver {
    home: PathBuf,
}

impl AgentDirClassPathResolver {
    /// Resolve against `home`.
    #[must_use]
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn boot_dir(&self) -> PathBuf {
        self.home.join(BOOT_DIR)
    }

    fn invalid(&self, message: impl Into<String>) -> BootError {
        BootError::LayoutInvalid {
            home: self.home.clone(),
            message: message.into(),
        }
    }
}

impl ClassPathResolver for AgentDirClassPathResolver {
    fn verify(&self) -> BootResult<()> {
        if !self.home.is_dir() {
            return Err(self.invalid("agent home is not a directory"));
        }
        if self.agent_jar_path().is_none() {
            return Err(self.invalid(format!("no {BOOTSTRAP_ARCHIVE_PREFIX} archive found")));
        }

        let boot_dir = self.boot_dir();
        if !boot_dir.is_dir() {
            return Err(self.invalid(format!("missing {BOOT_DIR} directory")));
        }
        let boot_archives = list_files(&boot_dir, is_plugin_archive)?;
        for prefix in REQUIRED_BOOT_ARCHIVES {
            if find_with_prefix(&boot_archives, prefix).is_none() {
                return Err(self.invalid(format!("no {prefix} archive in {BOOT_DIR}")));
            }
        }

        if !self.agent_lib_path().is_dir() {
            return Err(self.invalid(format!("missing {LIB_DIR} directory")));
        }

        debug!(home = %self.home.display(), "Verified agent home");
        Ok(())
    }

    fn agent_home(&self) -> &Path {
        &self.home
    }

    fn bootstrap_archives(&self) -> BootResult<Vec<PathBuf>> {
        list_files(&self.boot_dir(), is_plugin_archive).map_err(BootError::from)
    }

    fn resolve_plugins(&self) -> BootResult<Vec<ArchiveRef>> {
        let plugin_dir = self.home.join(PLUGIN_DIR);
        if !plugin_dir.is_dir() {
            warn!(dir = %plugin_dir.display(), "Plugin directory not found, no plugins loaded");
            return Ok(Vec::new());
        }
        let archives: Vec<ArchiveRef> = list_files(&plugin_dir, is_plugin_archive)?
            .into_iter()
            .map(ArchiveRef::new)
            .collect();
        debug!(count = archives.len(), "Resolved plugin archives");
        Ok(archives)
    }

    fn resolve_lib(&self) -> BootResult<Vec<PathBuf>> {
        let lib_dir = self.agent_lib_path();
        let mut libs = vec![lib_dir.clone()];
        libs.extend(list_files(&lib_dir, |path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| LIB_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
        })?);
        Ok(libs)
    }

    fn agent_config_path(&self) -> Option<PathBuf> {
        let path = self.home.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }

    fn agent_log_file_path(&self) -> PathBuf {
        self.home.join(LOG_DIR)
    }

    fn agent_jar_path(&self) -> Option<PathBuf> {
        let root_archives = list_files(&self.home, is_plugin_archive).ok()?;
        find_with_prefix(&root_archives, BOOTSTRAP_ARCHIVE_PREFIX).cloned()
    }

    fn agent_lib_path(&self) -> PathBuf {
        self.home.join(LIB_DIR)
    }
}

/// Regular files in `dir` accepted by `keep`, sorted by file name.
fn list_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && keep(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn find_with_prefix<'a>(files: &'a [PathBuf], prefix: &str) -> Option<&'a PathBuf> {
    files.iter().find(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn scaffold(home: &Path) {
        touch(&home.join("probe-bootstrap-0.1.1.tgz"));
        touch(&home.join("boot/probe-commons-0.1.1.tgz"));
        touch(&home.join("boot/probe-bootstrap-core-0.1.1.tgz"));
        std::fs::create_dir_all(home.join("lib")).unwrap();
    }

    #[test]
    fn test_verify_complete_layout() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        let resolver = AgentDirClassPathResolver::new(dir.path());
        resolver.verify().unwrap();
        assert_eq!(
            resolver.agent_jar_path().unwrap(),
            dir.path().join("probe-bootstrap-0.1.1.tgz")
        );
    }

    #[test]
    fn test_verify_missing_boot_archive() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        std::fs::remove_file(dir.path().join("boot/probe-commons-0.1.1.tgz")).unwrap();
        let err = AgentDirClassPathResolver::new(dir.path())
            .verify()
            .unwrap_err();
        assert!(err.to_string().contains("probe-commons"), "{err}");
    }

    #[test]
    fn test_verify_missing_bootstrap_archive() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        std::fs::remove_file(dir.path().join("probe-bootstrap-0.1.1.tgz")).unwrap();
        assert!(matches!(
            AgentDirClassPathResolver::new(dir.path()).verify(),
            Err(BootError::LayoutInvalid { .. })
        ));
    }

    #[test]
    fn test_resolve_plugins_sorted_archives_only() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        touch(&dir.path().join("plugin/zeta-plugin.tgz"));
        touch(&dir.path().join("plugin/alpha-plugin.tar.gz"));
        touch(&dir.path().join("plugin/README.md"));

        let plugins = AgentDirClassPathResolver::new(dir.path())
            .resolve_plugins()
            .unwrap();
        let names: Vec<String> = plugins.iter().map(ArchiveRef::file_name).collect();
        assert_eq!(names, ["alpha-plugin.tar.gz", "zeta-plugin.tgz"]);
    }

    #[test]
    fn test_resolve_plugins_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        let plugins = AgentDirClassPathResolver::new(dir.path())
            .resolve_plugins()
            .unwrap();
        assert!(plugins.is_empty());
    }

    #[test]
    fn test_resolve_lib() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        touch(&dir.path().join("lib/probe-profiler-0.1.1.tgz"));
        touch(&dir.path().join("lib/log4rs.xml"));
        touch(&dir.path().join("lib/notes.txt"));

        let resolver = AgentDirClassPathResolver::new(dir.path());
        let libs = resolver.resolve_lib().unwrap();
        assert_eq!(
            libs,
            [
                dir.path().join("lib"),
                dir.path().join("lib/log4rs.xml"),
                dir.path().join("lib/probe-profiler-0.1.1.tgz"),
            ]
        );
    }

    #[test]
    fn test_config_and_log_paths() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path());
        let resolver = AgentDirClassPathResolver::new(dir.path());
        assert!(resolver.agent_config_path().is_none());
        touch(&dir.path().join("probe.toml"));
        assert_eq!(
            resolver.agent_config_path().unwrap(),
            dir.path().join("probe.toml")
        );
        assert_eq!(resolver.agent_log_file_path(), dir.path().join("log"));
    }
}
