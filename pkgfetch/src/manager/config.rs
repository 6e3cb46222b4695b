//! Runtime configuration for the package service.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    default_cache_dir, default_download_dir, ArchiveKind, ConfigFile,
    DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_SERVICE_TIMEOUT_SECS,
};

use super::environment::{HostEnvironment, InstanceInfo, OperatingSystem};

/// Configuration for the package service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Control plane base URL.
    pub endpoint: Option<String>,

    /// Archive backend to construct.
    pub archive: ArchiveKind,

    /// Manifest supplied up front for the repository archive.
    pub repository_manifest: Option<String>,

    /// Root directory of the manifest cache.
    pub cache_dir: PathBuf,

    /// Directory downloaded artifacts are written to.
    pub download_dir: PathBuf,

    /// Control plane request timeout.
    pub service_timeout: Duration,

    /// Artifact download timeout.
    pub download_timeout: Duration,

    /// Host fields that take precedence over detection. Empty means detect.
    pub host_overrides: HostEnvironment,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            archive: ArchiveKind::default(),
            repository_manifest: None,
            cache_dir: default_cache_dir(),
            download_dir: default_download_dir(),
            service_timeout: Duration::from_secs(DEFAULT_SERVICE_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            host_overrides: HostEnvironment::default(),
        }
    }
}

impl ManagerConfig {
    /// Create a configuration talking to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    /// Build the runtime view of a loaded config file.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let host = &file.host;
        let value = |v: &Option<String>| v.clone().unwrap_or_default();

        Self {
            endpoint: file.service.endpoint.clone(),
            archive: file.service.archive,
            repository_manifest: None,
            cache_dir: file.cache.directory.clone(),
            download_dir: file.download.directory.clone(),
            service_timeout: Duration::from_secs(file.service.timeout),
            download_timeout: Duration::from_secs(file.download.timeout),
            host_overrides: HostEnvironment {
                operating_system: OperatingSystem {
                    platform: value(&host.platform),
                    platform_version: value(&host.platform_version),
                    architecture: value(&host.architecture),
                },
                instance: InstanceInfo {
                    instance_id: value(&host.instance_id),
                    instance_type: value(&host.instance_type),
                    region: value(&host.region),
                    availability_zone: value(&host.availability_zone),
                },
            },
        }
    }

    /// Set the control plane endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Select the archive backend.
    pub fn with_archive(mut self, archive: ArchiveKind) -> Self {
        self.archive = archive;
        self
    }

    /// Supply the manifest for the repository archive instead of fetching it.
    pub fn with_repository_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.repository_manifest = Some(manifest.into());
        self
    }

    /// Set the manifest cache directory.
    pub fn with_cache_dir(mut self, path: PathBuf) -> Self {
        self.cache_dir = path;
        self
    }

    /// Set the artifact download directory.
    pub fn with_download_dir(mut self, path: PathBuf) -> Self {
        self.download_dir = path;
        self
    }

    /// Set the control plane timeout.
    pub fn with_service_timeout(mut self, timeout: Duration) -> Self {
        self.service_timeout = timeout;
        self
    }

    /// Set the download timeout.
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Set host fields that take precedence over detection.
    pub fn with_host_overrides(mut self, overrides: HostEnvironment) -> Self {
        self.host_overrides = overrides;
        self
    }
}
