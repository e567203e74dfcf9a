//! Plugin archive access.
//!
//! A plugin archive is a gzip-compressed tarball. Opening one indexes every
//! entry name and keeps the (small) `META-INF/` entries in memory; class
//! bytes are read from disk on demand so a deleted or replaced archive is
//! noticed at injection time.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::ops::ControlFlow;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::descriptor::ServiceDescriptor;
use crate::error::{PluginError, PluginResult};
use crate::manifest::Manifest;

/// Maximum number of entries allowed in a plugin archive.
const MAX_ENTRY_COUNT: usize = 10_000;

/// Maximum size of a single `META-INF/` entry held in memory (1 MB).
const MAX_METADATA_SIZE: u64 = 1024 * 1024;

/// Maximum size of a class or resource entry (64 MB).
const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Directory holding archive metadata.
pub const METADATA_DIR: &str = "META-INF/";

/// Manifest entry name.
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Directory holding service descriptors.
pub const SERVICES_DIR: &str = "META-INF/services/";

/// File name suffixes recognised as plugin archives.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[".tgz", ".tar.gz"];

/// Returns `true` if the file name carries a plugin archive extension.
#[must_use]
pub fn is_plugin_archive(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            let name = name.to_ascii_lowercase();
            ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        })
}

/// Location of one plugin archive on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveRef {
    path: PathBuf,
}

impl ArchiveRef {
    /// Reference the archive at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the archive.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The archive's file name, for log fields.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Check that the archive still exists as a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ArchiveUnavailable`] if it is gone or is not a
    /// regular file.
    pub fn verify_accessible(&self) -> PluginResult<()> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(self.unavailable("not a regular file".to_string())),
            Err(e) => Err(self.unavailable(e.to_string())),
        }
    }

    fn unavailable(&self, message: String) -> PluginError {
        PluginError::ArchiveUnavailable {
            path: self.path.clone(),
            message,
        }
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<PathBuf> for ArchiveRef {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// An opened and indexed plugin archive.
#[derive(Debug, Clone)]
pub struct PluginArchive {
    reference: ArchiveRef,
    entries: Vec<String>,
    metadata: BTreeMap<String, Vec<u8>>,
}

impl PluginArchive {
    /// Open and index the archive.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ArchiveOpen`] if the file cannot be read, is
    /// not a valid gzip tarball, has an unsafe entry path, or exceeds the
    /// entry limits.
    pub fn open(reference: &ArchiveRef) -> PluginResult<Self> {
        let mut entries = Vec::new();
        let mut metadata = BTreeMap::new();

        scan(reference.path(), |name, reader, size| {
            if name.starts_with(METADATA_DIR) {
                metadata.insert(name.to_string(), read_limited(reader, size, MAX_METADATA_SIZE)?);
            }
            entries.push(name.to_string());
            Ok(ControlFlow::Continue(()))
        })
        .map_err(|message| PluginError::ArchiveOpen {
            path: reference.path().to_path_buf(),
            message,
        })?;

        tracing::debug!(
            archive = %reference,
            entries = entries.len(),
            "Indexed plugin archive"
        );

        Ok(Self {
            reference: reference.clone(),
            entries,
            metadata,
        })
    }

    /// The archive's location.
    #[must_use]
    pub fn reference(&self) -> &ArchiveRef {
        &self.reference
    }

    /// Whether the archive had an entry with this name when it was opened.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e == name)
    }

    /// Raw bytes of a `META-INF/` entry.
    #[must_use]
    pub fn metadata_entry(&self, name: &str) -> Option<&[u8]> {
        self.metadata.get(name).map(Vec::as_slice)
    }

    /// Parse the archive manifest, if present.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ManifestParse`] if the manifest is not UTF-8 or
    /// is malformed.
    pub fn manifest(&self) -> PluginResult<Option<Manifest>> {
        let Some(bytes) = self.metadata_entry(MANIFEST_ENTRY) else {
            return Ok(None);
        };
        Manifest::from_bytes(bytes)
            .map(Some)
            .map_err(|message| PluginError::ManifestParse {
                path: self.reference.path().to_path_buf(),
                message,
            })
    }

    /// Parse the service descriptor for `interface`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::DescriptorParse`] if the descriptor is not
    /// UTF-8 or names an invalid type.
    pub fn service_descriptor(&self, interface: &str) -> PluginResult<Option<ServiceDescriptor>> {
        let name = format!("{SERVICES_DIR}{interface}");
        let Some(bytes) = self.metadata_entry(&name) else {
            return Ok(None);
        };
        ServiceDescriptor::from_bytes(bytes)
            .map(Some)
            .map_err(|message| PluginError::DescriptorParse {
                path: self.reference.path().to_path_buf(),
                message,
            })
    }
}

/// Read one entry straight from the archive on disk.
///
/// # Errors
///
/// Returns [`PluginError::ArchiveUnavailable`] if the archive can no longer
/// be read and [`PluginError::EntryNotFound`] if it has no such entry.
pub(crate) fn read_entry(reference: &ArchiveRef, entry: &str) -> PluginResult<Vec<u8>> {
    let mut found = None;
    scan(reference.path(), |name, reader, size| {
        if name == entry {
            found = Some(read_limited(reader, size, MAX_ENTRY_SIZE)?);
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    })
    .map_err(|message| PluginError::ArchiveUnavailable {
        path: reference.path().to_path_buf(),
        message,
    })?;

    found.ok_or_else(|| PluginError::EntryNotFound {
        path: reference.path().to_path_buf(),
        entry: entry.to_string(),
    })
}

/// Walk the regular-file entries of a gzip tarball.
fn scan<F>(path: &Path, mut visit: F) -> Result<(), String>
where
    F: FnMut(&str, &mut dyn Read, u64) -> Result<ControlFlow<()>, String>,
{
    let file = File::open(path).map_err(|e| format!("failed to open: {e}"))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let mut entry_count = 0usize;

    for entry_result in archive
        .entries()
        .map_err(|e| format!("failed to read archive entries: {e}"))?
    {
        let mut entry = entry_result.map_err(|e| format!("failed to read archive entry: {e}"))?;

        entry_count = entry_count.saturating_add(1);
        if entry_count > MAX_ENTRY_COUNT {
            return Err(format!(
                "archive exceeds maximum entry count ({MAX_ENTRY_COUNT})"
            ));
        }

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let size = entry
            .header()
            .size()
            .map_err(|e| format!("failed to read entry size: {e}"))?;
        let raw_path = entry
            .path()
            .map_err(|e| format!("failed to read entry path: {e}"))?
            .into_owned();
        let name = normalize_entry_path(&raw_path)?;

        if visit(&name, &mut entry, size)?.is_break() {
            break;
        }
    }

    Ok(())
}

/// Read an entry fully, refusing anything larger than `limit`.
fn read_limited(reader: &mut dyn Read, size: u64, limit: u64) -> Result<Vec<u8>, String> {
    if size > limit {
        return Err(format!("entry of {size} bytes exceeds limit of {limit} bytes"));
    }
    let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
    reader
        .take(limit)
        .read_to_end(&mut buf)
        .map_err(|e| format!("failed to read entry: {e}"))?;
    Ok(buf)
}

/// Turn a tar entry path into a `/`-separated entry name.
///
/// Rejects absolute paths and `..` components.
fn normalize_entry_path(path: &Path) -> Result<String, String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| format!("non-UTF-8 entry path: {}", path.display()))?,
            ),
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(format!("unsafe entry path: {}", path.display()));
            },
        }
    }
    Ok(parts.join("/"))
}
