//! Trait definitions for the package service's collaborators.
//!
//! These traits enable dependency injection and testing of the manager
//! components. The service never names a concrete backend, cache, downloader
//! or transport.

use std::collections::HashMap;
use std::path::PathBuf;

use super::manifest::{Manifest, ResolvedFile};
use super::reporter::ResultReport;
use super::ManagerResult;

/// Version sentinel requesting the newest published manifest.
pub const LATEST_VERSION: &str = "latest";

/// Remote archive holding package manifests and artifacts.
pub trait PackageArchive: Send + Sync {
    /// Service name of this archive.
    fn name(&self) -> &str;

    /// Fetch the raw manifest for a package version (or [`LATEST_VERSION`]).
    fn download_manifest_bytes(&self, package_name: &str, version: &str)
        -> ManagerResult<Vec<u8>>;

    /// Canonical identifier of the package a manifest describes.
    ///
    /// Used as the cache key together with the manifest version.
    fn resource_identifier(&self, manifest: &Manifest) -> String;

    /// Map a requested name and version onto the archive's canonical pair.
    fn resource_version(&self, package_name: &str, version: &str) -> (String, String);

    /// URL from which `file` can be downloaded.
    fn download_location(
        &self,
        file: &ResolvedFile,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<String>;
}

/// Persistent store of raw manifest bytes.
pub trait ManifestCache: Send + Sync {
    /// Read the manifest stored under the key.
    ///
    /// Returns [`ManagerError::CacheMiss`](super::ManagerError::CacheMiss)
    /// when nothing is stored.
    fn read_manifest(&self, resource: &str, version: &str) -> ManagerResult<Vec<u8>>;

    /// Store manifest bytes under the key, replacing any previous entry.
    fn write_manifest(&self, resource: &str, version: &str, data: &[u8]) -> ManagerResult<()>;
}

/// Input to an artifact download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub source_url: String,
    /// Algorithm name to expected lowercase hex digest.
    pub checksums: HashMap<String, String>,
}

/// Checksum-verifying file downloader.
pub trait ArtifactDownloader: Send + Sync {
    /// Download the artifact and return the local file path.
    fn download(&self, request: &DownloadRequest) -> ManagerResult<PathBuf>;
}

/// Remote endpoint accepting result reports.
pub trait ReportTransport: Send + Sync {
    fn submit(&self, report: &ResultReport) -> ManagerResult<()>;
}
