//! Per-archive plugin discovery.

use probe_core::namespace::PLUGIN_SERVICE_INTERFACE;
use tracing::debug;

use crate::archive::PluginArchive;
use crate::catalog::PluginCatalog;
use crate::error::{PluginError, PluginResult};
use crate::plugin::DiscoveredPlugin;

/// Instantiate every plugin type listed in this archive's service
/// descriptor, in descriptor order.
///
/// Only the archive's own descriptor is consulted. An archive without one
/// provides no plugins. A listed type must ship its class in this archive,
/// so one archive cannot claim a plugin packaged in another.
///
/// # Errors
///
/// Returns [`PluginError::DescriptorParse`] if the descriptor is malformed,
/// [`PluginError::ProviderNotInArchive`] if a listed type's class is not in
/// the archive and [`PluginError::ProviderNotFound`] if a listed type has no
/// factory in `catalog`.
pub fn discover_plugins(
    archive: &PluginArchive,
    catalog: &PluginCatalog,
) -> PluginResult<Vec<DiscoveredPlugin>> {
    let Some(descriptor) = archive.service_descriptor(PLUGIN_SERVICE_INTERFACE)? else {
        debug!(archive = %archive.reference(), "Plugin archive has no service descriptor");
        return Ok(Vec::new());
    };

    descriptor
        .types()
        .iter()
        .map(|type_name| {
            if !archive.contains(&type_name.entry_path()) {
                return Err(PluginError::ProviderNotInArchive {
                    type_name: type_name.to_string(),
                    path: archive.reference().path().to_path_buf(),
                });
            }
            let plugin =
                catalog
                    .instantiate(type_name)
                    .ok_or_else(|| PluginError::ProviderNotFound {
                        type_name: type_name.to_string(),
                        path: archive.reference().path().to_path_buf(),
                    })?;
            debug!(
                archive = %archive.reference(),
                plugin = %type_name,
                "Discovered plugin"
            );
            Ok(DiscoveredPlugin::new(
                type_name.clone(),
                archive.reference().clone(),
                plugin,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveRef;
    use crate::setup::PluginSetupContext;
    use probe_test::PluginArchiveBuilder;

    struct NoopPlugin;

    impl crate::plugin::ProfilerPlugin for NoopPlugin {
        fn setup(&self, _context: &mut PluginSetupContext<'_>) -> PluginResult<()> {
            Ok(())
        }
    }

    fn catalog() -> PluginCatalog {
        let mut catalog = PluginCatalog::new();
        catalog
            .register("com.a.APlugin", || Box::new(NoopPlugin))
            .unwrap();
        catalog
            .register("com.a.ASecondPlugin", || Box::new(NoopPlugin))
            .unwrap();
        catalog
    }

    fn open(builder: &PluginArchiveBuilder, dir: &std::path::Path) -> PluginArchive {
        let path = builder.write_to(dir, "plugin.tgz");
        PluginArchive::open(&ArchiveRef::new(path)).unwrap()
    }

    #[test]
    fn test_descriptor_order_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let archive = open(
            &PluginArchiveBuilder::new()
                .plugin("com.a.ASecondPlugin")
                .plugin("com.a.APlugin"),
            dir.path(),
        );

        let plugins = discover_plugins(&archive, &catalog()).unwrap();
        let types: Vec<&str> = plugins.iter().map(|p| p.type_name().as_str()).collect();
        assert_eq!(types, ["com.a.ASecondPlugin", "com.a.APlugin"]);
    }

    #[test]
    fn test_listed_type_must_ship_in_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = open(
            &PluginArchiveBuilder::new()
                .packages("com.b")
                .listed_plugin("com.a.APlugin"),
            dir.path(),
        );

        let err = discover_plugins(&archive, &catalog()).unwrap_err();
        assert!(matches!(
            err,
            PluginError::ProviderNotInArchive { ref type_name, .. } if type_name == "com.a.APlugin"
        ));
    }

    #[test]
    fn test_unregistered_type_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let archive = open(
            &PluginArchiveBuilder::new().plugin("com.x.UnknownPlugin"),
            dir.path(),
        );

        let err = discover_plugins(&archive, &catalog()).unwrap_err();
        assert!(matches!(err, PluginError::ProviderNotFound { .. }));
    }

    #[test]
    fn test_no_descriptor_means_no_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let archive = open(
            &PluginArchiveBuilder::new().class("com.a.APlugin", b"a"),
            dir.path(),
        );
        assert!(discover_plugins(&archive, &catalog()).unwrap().is_empty());
    }
}
