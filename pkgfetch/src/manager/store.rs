//! Manifest retrieval with cache change detection.

use std::sync::Arc;

use super::error::{ManagerError, ManagerResult};
use super::manifest::{parse_manifest, Manifest};
use super::trace::Tracer;
use super::traits::{ManifestCache, PackageArchive};

/// A freshly downloaded manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub manifest: Manifest,
    /// Canonical identifier the manifest is cached under.
    pub resource_arn: String,
    /// Whether the cache already held an identical manifest.
    pub unchanged_from_cache: bool,
}

/// Downloads manifests through an archive and keeps the cache current.
pub struct ManifestStore {
    archive: Arc<dyn PackageArchive>,
    cache: Arc<dyn ManifestCache>,
}

impl ManifestStore {
    pub fn new(archive: Arc<dyn PackageArchive>, cache: Arc<dyn ManifestCache>) -> Self {
        Self { archive, cache }
    }

    /// Download, parse and cache the manifest for a package version.
    ///
    /// The raw bytes are written to the cache under the manifest's own
    /// resource identifier and version on every call, whether or not they
    /// changed. A cached entry that cannot be read or parsed counts as
    /// changed.
    ///
    /// # Errors
    ///
    /// Backend and decode errors are returned as-is; a failed cache write is
    /// [`ManagerError::CacheWrite`].
    pub fn resolve_manifest(
        &self,
        tracer: &Tracer,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<ResolvedManifest> {
        let mut section = tracer.begin_section("download manifest");

        let result = self.fetch_and_cache(package_name, version);
        match &result {
            Ok(resolved) => {
                section.info(format!(
                    "{} version {} (unchanged: {})",
                    resolved.resource_arn, resolved.manifest.version, resolved.unchanged_from_cache
                ));
            }
            Err(e) => {
                section.with_error(e);
            }
        }
        result
    }

    fn fetch_and_cache(
        &self,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<ResolvedManifest> {
        let bytes = self.archive.download_manifest_bytes(package_name, version)?;
        let manifest = parse_manifest(&bytes)?;
        let resource_arn = self.archive.resource_identifier(&manifest);

        let unchanged_from_cache = match self.read_cached(&resource_arn, &manifest.version) {
            Ok(cached) => cached == manifest,
            Err(e) => {
                tracing::debug!(
                    resource = %resource_arn,
                    version = %manifest.version,
                    error = %e,
                    "No usable cached manifest"
                );
                false
            }
        };

        self.cache
            .write_manifest(&resource_arn, &manifest.version, &bytes)
            .map_err(|e| match e {
                ManagerError::CacheWrite { .. } => e,
                other => ManagerError::CacheWrite {
                    resource: resource_arn.clone(),
                    version: manifest.version.clone(),
                    reason: other.to_string(),
                },
            })?;

        tracing::info!(
            package = package_name,
            resource = %resource_arn,
            version = %manifest.version,
            unchanged = unchanged_from_cache,
            "Resolved manifest"
        );

        Ok(ResolvedManifest {
            manifest,
            resource_arn,
            unchanged_from_cache,
        })
    }

    /// Parse the manifest cached under exactly `(package_name, version)`.
    ///
    /// # Errors
    ///
    /// [`ManagerError::CacheMiss`] when nothing is cached,
    /// [`ManagerError::Decode`] when the cached bytes are malformed.
    pub fn load_cached_manifest(
        &self,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<Manifest> {
        self.read_cached(package_name, version)
    }

    fn read_cached(&self, resource: &str, version: &str) -> ManagerResult<Manifest> {
        let data = self.cache.read_manifest(resource, version)?;
        parse_manifest(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::cache::MemoryManifestCache;
    use crate::manager::clock::tests::FixedClock;
    use crate::manager::mocks::{FailingCache, MockArchive};

    const MANIFEST_V1: &str = r#"{
        "version": "1.0.0",
        "packages": { "linux": { "_any": { "x86_64": { "file": "pkg.zip" } } } },
        "files": { "pkg.zip": { "checksums": { "sha256": "abc" } } }
    }"#;

    fn tracer() -> Tracer {
        Tracer::new(Arc::new(FixedClock::at(0)))
    }

    fn store(archive: MockArchive, cache: Arc<dyn ManifestCache>) -> ManifestStore {
        ManifestStore::new(Arc::new(archive), cache)
    }

    #[test]
    fn test_first_download_is_changed_and_cached() {
        let cache = Arc::new(MemoryManifestCache::new());
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache.clone());

        let resolved = store.resolve_manifest(&tracer(), "pkg", "latest").unwrap();

        assert!(!resolved.unchanged_from_cache);
        assert_eq!(resolved.resource_arn, "arn:pkg");
        assert_eq!(resolved.manifest.version, "1.0.0");
        assert_eq!(
            cache.read_manifest("arn:pkg", "1.0.0").unwrap(),
            MANIFEST_V1.as_bytes()
        );
    }

    #[test]
    fn test_second_download_is_unchanged() {
        let cache = Arc::new(MemoryManifestCache::new());
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        store.resolve_manifest(&tracer(), "pkg", "latest").unwrap();
        let resolved = store.resolve_manifest(&tracer(), "pkg", "latest").unwrap();

        assert!(resolved.unchanged_from_cache);
    }

    #[test]
    fn test_structurally_equal_bytes_are_unchanged() {
        let cache = Arc::new(MemoryManifestCache::new());
        let reformatted = r#"{"files":{"pkg.zip":{"checksums":{"sha256":"abc"}}},"version":"1.0.0","packages":{"linux":{"_any":{"x86_64":{"file":"pkg.zip"}}}}}"#;
        cache
            .write_manifest("arn:pkg", "1.0.0", reformatted.as_bytes())
            .unwrap();
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache.clone());

        let resolved = store.resolve_manifest(&tracer(), "pkg", "1.0.0").unwrap();

        assert!(resolved.unchanged_from_cache);
        // Overwritten with the freshly fetched bytes.
        assert_eq!(
            cache.read_manifest("arn:pkg", "1.0.0").unwrap(),
            MANIFEST_V1.as_bytes()
        );
    }

    #[test]
    fn test_different_cached_manifest_is_changed() {
        let cache = Arc::new(MemoryManifestCache::new());
        let stale = MANIFEST_V1.replace("abc", "def");
        cache
            .write_manifest("arn:pkg", "1.0.0", stale.as_bytes())
            .unwrap();
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        let resolved = store.resolve_manifest(&tracer(), "pkg", "1.0.0").unwrap();
        assert!(!resolved.unchanged_from_cache);
    }

    #[test]
    fn test_corrupt_cached_manifest_is_changed_not_error() {
        let cache = Arc::new(MemoryManifestCache::new());
        cache.write_manifest("arn:pkg", "1.0.0", b"{garbage").unwrap();
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        let resolved = store.resolve_manifest(&tracer(), "pkg", "1.0.0").unwrap();
        assert!(!resolved.unchanged_from_cache);
    }

    #[test]
    fn test_cache_read_failure_is_not_fatal() {
        let cache = Arc::new(FailingCache::read_only_failure());
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        let resolved = store.resolve_manifest(&tracer(), "pkg", "1.0.0").unwrap();
        assert!(!resolved.unchanged_from_cache);
    }

    #[test]
    fn test_cache_write_failure_is_cache_write_error() {
        let cache = Arc::new(FailingCache::write_failure());
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        let err = store
            .resolve_manifest(&tracer(), "pkg", "1.0.0")
            .unwrap_err();
        match err {
            ManagerError::CacheWrite {
                resource, version, ..
            } => {
                assert_eq!(resource, "arn:pkg");
                assert_eq!(version, "1.0.0");
            }
            other => panic!("Expected CacheWrite, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_download_is_decode_error() {
        let cache = Arc::new(MemoryManifestCache::new());
        let store = store(MockArchive::new("arn:pkg", "not json"), cache);

        let tracer = tracer();
        let err = store.resolve_manifest(&tracer, "pkg", "1.0.0").unwrap_err();
        assert!(matches!(err, ManagerError::Decode { .. }));
        assert_eq!(tracer.entries()[0].exit_code, 1);
    }

    #[test]
    fn test_backend_error_propagates() {
        let cache = Arc::new(MemoryManifestCache::new());
        let store = store(MockArchive::failing("arn:pkg"), cache);

        let err = store
            .resolve_manifest(&tracer(), "pkg", "1.0.0")
            .unwrap_err();
        assert!(matches!(err, ManagerError::Backend { .. }));
    }

    #[test]
    fn test_load_cached_manifest_uses_caller_key() {
        let cache = Arc::new(MemoryManifestCache::new());
        cache
            .write_manifest("pkg", "1.0.0", MANIFEST_V1.as_bytes())
            .unwrap();
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        let manifest = store.load_cached_manifest("pkg", "1.0.0").unwrap();
        assert_eq!(manifest.version, "1.0.0");

        let miss = store.load_cached_manifest("arn:pkg", "1.0.0");
        assert!(matches!(miss, Err(ManagerError::CacheMiss { .. })));
    }

    #[test]
    fn test_load_cached_manifest_malformed_is_decode_error() {
        let cache = Arc::new(MemoryManifestCache::new());
        cache.write_manifest("pkg", "1.0.0", b"42").unwrap();
        let store = store(MockArchive::new("arn:pkg", MANIFEST_V1), cache);

        assert!(matches!(
            store.load_cached_manifest("pkg", "1.0.0"),
            Err(ManagerError::Decode { .. })
        ));
    }
}
