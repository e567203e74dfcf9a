//! The host runtime the agent is loaded into.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info};

use crate::error::{BootError, BootResult};

/// Name of the thread shutdown hooks run on.
pub const SHUTDOWN_THREAD_NAME: &str = "probe-shutdown-hook";

/// A callback run once when the host shuts down.
pub type ShutdownHook = Box<dyn FnOnce() + Send + 'static>;

/// Services the host process offers the agent.
pub trait HostRuntime: Send + Sync {
    /// Make an archive visible to the host's bootstrap search path.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be added.
    fn append_to_bootstrap_search(&self, archive: &Path) -> BootResult<()>;

    /// Register a hook to run at shutdown.
    fn add_shutdown_hook(&self, hook: ShutdownHook);
}

/// In-process [`HostRuntime`].
///
/// Keeps the bootstrap search path in memory and runs shutdown hooks when
/// [`run_shutdown_hooks`](Self::run_shutdown_hooks) is called.
#[derive(Default)]
pub struct ProcessRuntime {
    search_path: Mutex<Vec<PathBuf>>,
    hooks: Mutex<Vec<ShutdownHook>>,
}

impl ProcessRuntime {
    /// Create a runtime with an empty search path and no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives appended so far, in order.
    #[must_use]
    pub fn bootstrap_search_path(&self) -> Vec<PathBuf> {
        self.search_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of hooks waiting to run.
    #[must_use]
    pub fn pending_hooks(&self) -> usize {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run every registered hook on a dedicated thread and wait for it.
    ///
    /// Hooks are drained, so calling this again runs nothing. Returns the
    /// number of hooks run.
    pub fn run_shutdown_hooks(&self) -> usize {
        let hooks: Vec<ShutdownHook> = std::mem::take(
            &mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let count = hooks.len();
        if count == 0 {
            return 0;
        }

        info!(hooks = count, "Running shutdown hooks");
        let spawned = std::thread::Builder::new()
            .name(SHUTDOWN_THREAD_NAME.to_string())
            .spawn(move || {
                for hook in hooks {
                    hook();
                }
            });
        match spawned {
            Ok(handle) => {
                if handle.join().is_err() {
                    error!("Shutdown hook panicked");
                }
            },
            Err(e) => error!(error = %e, "Failed to spawn shutdown hook thread"),
        }
        count
    }
}

impl HostRuntime for ProcessRuntime {
    fn append_to_bootstrap_search(&self, archive: &Path) -> BootResult<()> {
        if !archive.is_file() {
            return Err(BootError::BootstrapSearch {
                path: archive.to_path_buf(),
                message: "not a regular file".to_string(),
            });
        }
        let mut search_path = self.search_path.lock().unwrap_or_else(PoisonError::into_inner);
        if !search_path.iter().any(|p| p == archive) {
            search_path.push(archive.to_path_buf());
        }
        debug!(archive = %archive.display(), "Appended to bootstrap search path");
        Ok(())
    }

    fn add_shutdown_hook(&self, hook: ShutdownHook) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }
}

impl std::fmt::Debug for ProcessRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRuntime")
            .field("search_path", &self.bootstrap_search_path())
            .field("pending_hooks", &self.pending_hooks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_hooks_run_once_on_named_thread() {
        let runtime = ProcessRuntime::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let thread_name = Arc::new(Mutex::new(None));

        let counter = Arc::clone(&calls);
        let name = Arc::clone(&thread_name);
        runtime.add_shutdown_hook(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            *name.lock().unwrap() = std::thread::current().name().map(str::to_string);
        }));
        assert_eq!(runtime.pending_hooks(), 1);

        assert_eq!(runtime.run_shutdown_hooks(), 1);
        assert_eq!(runtime.run_shutdown_hooks(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            thread_name.lock().unwrap().as_deref(),
            Some(SHUTDOWN_THREAD_NAME)
        );
    }

    #[test]
    fn test_append_to_bootstrap_search() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("probe-commons-0.1.1.tgz");
        std::fs::write(&archive, b"").unwrap();

        let runtime = ProcessRuntime::new();
        runtime.append_to_bootstrap_search(&archive).unwrap();
        runtime.append_to_bootstrap_search(&archive).unwrap();
        assert_eq!(runtime.bootstrap_search_path(), [archive]);

        assert!(matches!(
            runtime.append_to_bootstrap_search(&dir.path().join("missing.tgz")),
            Err(BootError::BootstrapSearch { .. })
        ));
    }
}
