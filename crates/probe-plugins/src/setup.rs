//! Plugin setup callbacks.

use std::sync::Arc;

use probe_core::{ClassName, namespace};
use tracing::info;

use crate::archive::ArchiveRef;
use crate::error::{PluginError, PluginResult};
use crate::injector::ArchiveClassInjector;
use crate::namespace::NamespaceId;
use crate::plugin::ProfilerPlugin;

/// A transformation a plugin registered: calls into `target` are routed
/// through `interceptor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformer {
    /// Class to instrument.
    pub target: ClassName,
    /// Interceptor class, resolved from the plugin's archive.
    pub interceptor: ClassName,
}

/// Outcome of configuring one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupResult {
    /// The configured plugin.
    pub plugin_type: ClassName,
    /// Archive the plugin came from.
    pub archive: ArchiveRef,
    /// Namespace the plugin's classes live in.
    pub namespace: NamespaceId,
    /// Registered transformations, in registration order.
    pub transformers: Vec<Transformer>,
    /// Classes injected during setup, in injection order.
    pub injected_classes: Vec<ClassName>,
}

/// Configures one plugin with its injector.
pub trait PluginSetup: Send + Sync {
    /// Configure `plugin`.
    ///
    /// # Errors
    ///
    /// Returning [`PluginError::ArchiveUnavailable`] stops the remaining
    /// plugins of the same archive. Any other error skips only this plugin.
    fn setup_plugin(
        &self,
        plugin: &dyn ProfilerPlugin,
        injector: Arc<ArchiveClassInjector>,
    ) -> PluginResult<SetupResult>;
}

/// What a plugin sees while it configures itself.
#[derive(Debug)]
pub struct PluginSetupContext<'a> {
    injector: &'a ArchiveClassInjector,
    transformers: Vec<Transformer>,
    injected: Vec<ClassName>,
}

impl<'a> PluginSetupContext<'a> {
    /// Start a context over `injector`.
    #[must_use]
    pub fn new(injector: &'a ArchiveClassInjector) -> Self {
        Self {
            injector,
            transformers: Vec::new(),
            injected: Vec::new(),
        }
    }

    /// The plugin's injector.
    #[must_use]
    pub fn injector(&self) -> &ArchiveClassInjector {
        self.injector
    }

    /// Register a transformation of `target` through `interceptor`.
    ///
    /// The interceptor is injected immediately, so it must be in the
    /// plugin's scope and present in its archive. The agent's own classes
    /// can never be targets.
    ///
    /// # Errors
    ///
    /// - [`PluginError::InvalidTypeName`] if either name is malformed
    /// - [`PluginError::OutOfScope`] if the target is reserved or the
    ///   interceptor is out of scope
    /// - any injection error for the interceptor
    pub fn add_transformer(&mut self, target: &str, interceptor: &str) -> PluginResult<()> {
        let target = ClassName::new(target)?;
        if namespace::is_reserved(target.as_str()) {
            return Err(PluginError::OutOfScope {
                class_name: target.to_string(),
                namespace: self.injector.namespace(),
            });
        }

        let class = self.injector.inject_class(interceptor)?;
        if !self.injected.contains(&class.class_name) {
            self.injected.push(class.class_name.clone());
        }
        self.transformers.push(Transformer {
            target,
            interceptor: class.class_name,
        });
        Ok(())
    }

    /// Inject a helper class without registering a transformation.
    ///
    /// # Errors
    ///
    /// See [`ArchiveClassInjector::inject_class`].
    pub fn inject_class(&mut self, class_name: &str) -> PluginResult<()> {
        let class = self.injector.inject_class(class_name)?;
        if !self.injected.contains(&class.class_name) {
            self.injected.push(class.class_name);
        }
        Ok(())
    }

    /// Registered transformations so far.
    #[must_use]
    pub fn transformers(&self) -> &[Transformer] {
        &self.transformers
    }

    /// Finish the context into a result.
    #[must_use]
    pub fn into_result(self) -> SetupResult {
        SetupResult {
            plugin_type: self.injector.plugin_type().clone(),
            archive: self.injector.archive().clone(),
            namespace: self.injector.namespace(),
            transformers: self.transformers,
            injected_classes: self.injected,
        }
    }
}

/// Runs [`ProfilerPlugin::setup`] against a fresh [`PluginSetupContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPluginSetup;

impl DefaultPluginSetup {
    /// Create the default setup.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PluginSetup for DefaultPluginSetup {
    fn setup_plugin(
        &self,
        plugin: &dyn ProfilerPlugin,
        injector: Arc<ArchiveClassInjector>,
    ) -> PluginResult<SetupResult> {
        let mut context = PluginSetupContext::new(&injector);
        plugin.setup(&mut context)?;
        let result = context.into_result();
        info!(
            plugin = %result.plugin_type,
            namespace = %result.namespace,
            transformers = result.transformers.len(),
            injected = result.injected_classes.len(),
            "Configured plugin"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ScopeFilterChain, plugin_package_filter, profiler_package_skip_filter};
    use crate::namespace::NamespaceTable;
    use crate::package::PackageList;
    use probe_test::PluginArchiveBuilder;

    struct HttpPlugin;

    impl ProfilerPlugin for HttpPlugin {
        fn setup(&self, context: &mut PluginSetupContext<'_>) -> PluginResult<()> {
            context.add_transformer(
                "org.apache.http.impl.client.CloseableHttpClient",
                "com.example.http.ExecuteInterceptor",
            )?;
            context.add_transformer(
                "org.apache.http.impl.client.InternalHttpClient",
                "com.example.http.ExecuteInterceptor",
            )?;
            context.inject_class("com.example.http.HeaderUtils")
        }
    }

    fn injector_for(dir: &std::path::Path) -> Arc<ArchiveClassInjector> {
        let path = PluginArchiveBuilder::new()
            .class("com.example.http.ExecuteInterceptor", b"interceptor")
            .class("com.example.http.HeaderUtils", b"utils")
            .write_to(dir, "http.tgz");
        let table = Arc::new(NamespaceTable::new());
        let packages = PackageList::new(["com.example.http"]);
        let filter = ScopeFilterChain::new(vec![
            profiler_package_skip_filter(),
            plugin_package_filter(&packages),
        ]);
        let ns = table.register(ArchiveRef::new(&path), packages, Arc::new(filter));
        Arc::new(
            ArchiveClassInjector::new(table, ns, ClassName::new("com.example.http.HttpPlugin").unwrap())
                .unwrap(),
        )
    }

    #[test]
    fn test_default_setup_collects_transformers() {
        let dir = tempfile::tempdir().unwrap();
        let injector = injector_for(dir.path());

        let result = DefaultPluginSetup::new()
            .setup_plugin(&HttpPlugin, injector)
            .unwrap();

        assert_eq!(result.plugin_type.as_str(), "com.example.http.HttpPlugin");
        assert_eq!(result.transformers.len(), 2);
        assert_eq!(
            result.transformers[0].interceptor.as_str(),
            "com.example.http.ExecuteInterceptor"
        );
        let injected: Vec<&str> = result.injected_classes.iter().map(ClassName::as_str).collect();
        assert_eq!(
            injected,
            ["com.example.http.ExecuteInterceptor", "com.example.http.HeaderUtils"]
        );
    }

    #[test]
    fn test_interceptor_must_be_in_scope() {
        let dir = tempfile::tempdir().unwrap();
        let injector = injector_for(dir.path());
        let mut context = PluginSetupContext::new(&injector);

        let err = context
            .add_transformer("org.acme.Service", "org.acme.ForeignInterceptor")
            .unwrap_err();
        assert!(matches!(err, PluginError::OutOfScope { .. }));
        assert!(context.transformers().is_empty());
    }

    #[test]
    fn test_reserved_target_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let injector = injector_for(dir.path());
        let mut context = PluginSetupContext::new(&injector);

        let err = context
            .add_transformer(
                "io.probe.profiler.DefaultAgent",
                "com.example.http.ExecuteInterceptor",
            )
            .unwrap_err();
        assert!(matches!(err, PluginError::OutOfScope { .. }));
    }

    #[test]
    fn test_missing_interceptor() {
        let dir = tempfile::tempdir().unwrap();
        let injector = injector_for(dir.path());
        let mut context = PluginSetupContext::new(&injector);

        let err = context
            .add_transformer("org.acme.Service", "com.example.http.Missing")
            .unwrap_err();
        assert!(matches!(err, PluginError::EntryNotFound { .. }));
    }
}
