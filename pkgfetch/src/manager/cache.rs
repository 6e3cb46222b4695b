//! Manifest cache adapters.
//!
//! Two [`ManifestCache`] implementations:
//!
//! - [`FileManifestCache`] - one file per (resource, version) under a root
//!   directory; survives process restarts
//! - [`MemoryManifestCache`] - a process-local map, for embedding and tests
//!
//! Both store raw bytes without interpretation and replace entries whole.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use super::error::{ManagerError, ManagerResult};
use super::traits::ManifestCache;

/// File name extension of cached manifests.
const MANIFEST_EXTENSION: &str = "json";

/// Directory-backed manifest cache.
///
/// Layout: `<root>/<resource digest>/<encoded version>.json`. Resource identifiers
/// are ARNs or names containing `:` and `/`, so the directory name is a
/// digest of the identifier; the identifier itself is written alongside in a
/// `resource` file for inspection.
#[derive(Debug, Clone)]
pub struct FileManifestCache {
    root: PathBuf,
}

impl FileManifestCache {
    /// Create a cache rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every cached version of `resource`.
    pub fn resource_dir(&self, resource: &str) -> PathBuf {
        self.root.join(resource_digest(resource))
    }

    /// Path of the cached manifest for `(resource, version)`.
    pub fn manifest_path(&self, resource: &str, version: &str) -> PathBuf {
        self.resource_dir(resource)
            .join(format!("{}.{}", encode_version(version), MANIFEST_EXTENSION))
    }
}

impl ManifestCache for FileManifestCache {
    fn read_manifest(&self, resource: &str, version: &str) -> ManagerResult<Vec<u8>> {
        let path = self.manifest_path(resource, version);
        match fs::read(&path) {
            Ok(data) => {
                tracing::debug!(path = %path.display(), "Manifest cache hit");
                Ok(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ManagerError::CacheMiss {
                resource: resource.to_string(),
                version: version.to_string(),
            }),
            Err(e) => Err(ManagerError::ReadFailed { path, source: e }),
        }
    }

    fn write_manifest(&self, resource: &str, version: &str, data: &[u8]) -> ManagerResult<()> {
        let dir = self.resource_dir(resource);
        let cache_write = |reason: String| ManagerError::CacheWrite {
            resource: resource.to_string(),
            version: version.to_string(),
            reason,
        };

        fs::create_dir_all(&dir)
            .map_err(|e| cache_write(format!("cannot create {}: {}", dir.display(), e)))?;

        let marker = dir.join("resource");
        if !marker.exists() {
            fs::write(&marker, resource.as_bytes())
                .map_err(|e| cache_write(format!("cannot write {}: {}", marker.display(), e)))?;
        }

        // Write beside the target and rename so readers never see a partial file.
        let path = self.manifest_path(resource, version);
        let tmp = path.with_extension("tmp");
        let write_tmp = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()
        };
        write_tmp().map_err(|e| cache_write(format!("cannot write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| {
            fs::remove_file(&tmp).ok();
            cache_write(format!("cannot replace {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Manifest cached");
        Ok(())
    }
}

/// Process-local manifest cache.
#[derive(Debug, Default)]
pub struct MemoryManifestCache {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached manifests.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ManifestCache for MemoryManifestCache {
    fn read_manifest(&self, resource: &str, version: &str) -> ManagerResult<Vec<u8>> {
        self.entries
            .read()
            .get(&(resource.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| ManagerError::CacheMiss {
                resource: resource.to_string(),
                version: version.to_string(),
            })
    }

    fn write_manifest(&self, resource: &str, version: &str, data: &[u8]) -> ManagerResult<()> {
        self.entries
            .write()
            .insert((resource.to_string(), version.to_string()), data.to_vec());
        Ok(())
    }
}

/// Hex digest of a resource identifier, shortened for directory names.
fn resource_digest(resource: &str) -> String {
    let digest = Sha256::digest(resource.as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Encode a version as a file name stem.
///
/// ASCII alphanumerics and `.`, `-`, `+` are kept; every other byte,
/// including `_` itself, becomes `_` followed by two hex digits. The
/// encoding is injective, so distinct versions never share a file.
fn encode_version(version: &str) -> String {
    let mut encoded = String::with_capacity(version.len());
    for byte in version.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'+') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("_{:02x}", byte));
        }
    }
    encoded
}
