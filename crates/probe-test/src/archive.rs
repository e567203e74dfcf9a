//! Plugin archive builder.

use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use probe_core::namespace::PLUGIN_SERVICE_INTERFACE;

/// Builds gzip-compressed plugin archives for tests.
#[derive(Debug, Clone, Default)]
pub struct PluginArchiveBuilder {
    manifest: Vec<(String, String)>,
    plugins: Vec<(String, bool)>,
    entries: Vec<(String, Vec<u8>)>,
}

impl PluginArchiveBuilder {
    /// Start an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest main attribute. The manifest is only written if at
    /// least one attribute is added.
    #[must_use]
    pub fn manifest_attribute(mut self, name: &str, value: &str) -> Self {
        self.manifest.push((name.to_string(), value.to_string()));
        self
    }

    /// Declare the packages the archive's plugins are scoped to.
    #[must_use]
    pub fn packages(self, packages: &str) -> Self {
        self.manifest_attribute("Probe-Plugin-Package", packages)
    }

    /// List a plugin type in the service descriptor and ship a placeholder
    /// class entry for it. A later [`class`](Self::class) call for the same
    /// type replaces the placeholder.
    #[must_use]
    pub fn plugin(mut self, type_name: &str) -> Self {
        self.plugins.push((type_name.to_string(), true));
        self
    }

    /// List a plugin type in the service descriptor without shipping its
    /// class.
    #[must_use]
    pub fn listed_plugin(mut self, type_name: &str) -> Self {
        self.plugins.push((type_name.to_string(), false));
        self
    }

    /// Add a class entry (`a.b.C` is stored at `a/b/C.class`).
    #[must_use]
    pub fn class(self, class_name: &str, bytes: &[u8]) -> Self {
        self.raw_entry(&class_entry(class_name), bytes)
    }

    /// Add a resource entry.
    #[must_use]
    pub fn resource(self, path: &str, bytes: &[u8]) -> Self {
        self.raw_entry(path, bytes)
    }

    /// Add an entry verbatim. Overrides generated manifest, descriptor or
    /// placeholder class entries with the same name.
    #[must_use]
    pub fn raw_entry(mut self, name: &str, bytes: &[u8]) -> Self {
        self.entries.push((name.to_string(), bytes.to_vec()));
        self
    }

    /// Encode the archive.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        if !self.manifest.is_empty() {
            let mut manifest = String::new();
            for (name, value) in &self.manifest {
                manifest.push_str(&format!("{name}: {value}\r\n"));
            }
            entries.push(("META-INF/MANIFEST.MF".to_string(), manifest.into_bytes()));
        }
        if !self.plugins.is_empty() {
            let mut descriptor = String::from("# Plugins provided by this archive\n");
            for (plugin, _) in &self.plugins {
                descriptor.push_str(plugin);
                descriptor.push('\n');
            }
            entries.push((
                format!("META-INF/services/{PLUGIN_SERVICE_INTERFACE}"),
                descriptor.into_bytes(),
            ));
        }
        for (plugin, _) in self.plugins.iter().filter(|(_, shipped)| *shipped) {
            entries.push((class_entry(plugin), plugin.clone().into_bytes()));
        }
        for (name, bytes) in &self.entries {
            entries.retain(|(existing, _)| existing != name);
            entries.push((name.clone(), bytes.clone()));
        }

        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, bytes) in &entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, bytes.as_slice())
                .expect("append archive entry");
        }
        builder
            .into_inner()
            .expect("finish tar stream")
            .finish()
            .expect("finish gzip stream")
    }

    /// Write the archive to `dir/file_name` and return its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create archive directory");
        }
        std::fs::write(&path, self.build()).expect("write archive");
        path
    }
}

fn class_entry(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}
