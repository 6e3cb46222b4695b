//! Package service facade.
//!
//! [`PackageService`] binds one archive backend to the manifest cache, the
//! host environment collector, the artifact downloader and the result
//! transport, and exposes the operations a package installer calls.

use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::{ControlPlane, DocumentArchive, HttpControlPlane, RepositoryArchive};
use crate::config::ArchiveKind;

use super::cache::FileManifestCache;
use super::clock::{NanoTime, SystemClock};
use super::config::ManagerConfig;
use super::download::HttpDownloader;
use super::environment::{EnvironmentCollector, SystemCollector};
use super::error::{ManagerError, ManagerResult};
use super::locator::{self, locate_file};
use super::manifest::{Manifest, ResolvedFile};
use super::reporter::{PackageResult, ResultReporter};
use super::selector::resolve_variant;
use super::store::ManifestStore;
use super::trace::Tracer;
use super::traits::{ArtifactDownloader, ManifestCache, PackageArchive, ReportTransport};

/// Outcome of a manifest download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    /// Identifier the manifest was cached under.
    pub resource_arn: String,
    /// Package version the manifest describes.
    pub version: String,
    /// Whether the cache already held an identical manifest.
    pub unchanged_from_cache: bool,
}

/// Caller-facing package operations over one archive backend.
pub struct PackageService {
    archive: Arc<dyn PackageArchive>,
    store: ManifestStore,
    collector: Arc<dyn EnvironmentCollector>,
    downloader: Arc<dyn ArtifactDownloader>,
    reporter: ResultReporter,
}

impl PackageService {
    /// Create a service from explicit collaborators.
    pub fn new(
        archive: Arc<dyn PackageArchive>,
        cache: Arc<dyn ManifestCache>,
        collector: Arc<dyn EnvironmentCollector>,
        downloader: Arc<dyn ArtifactDownloader>,
        transport: Arc<dyn ReportTransport>,
        clock: Arc<dyn NanoTime>,
    ) -> Self {
        Self {
            store: ManifestStore::new(archive.clone(), cache),
            reporter: ResultReporter::new(collector.clone(), transport, clock),
            archive,
            collector,
            downloader,
        }
    }

    /// Service over the document archive, reporting to the same control plane.
    pub fn with_document_archive<C>(
        control_plane: Arc<C>,
        cache: Arc<dyn ManifestCache>,
        collector: Arc<dyn EnvironmentCollector>,
        downloader: Arc<dyn ArtifactDownloader>,
    ) -> Self
    where
        C: ControlPlane + ReportTransport + 'static,
    {
        let archive = Arc::new(DocumentArchive::new(control_plane.clone()));
        Self::new(archive, cache, collector, downloader, control_plane, Arc::new(SystemClock))
    }

    /// Service over the repository archive, optionally with the manifest
    /// already in hand.
    pub fn with_repository_archive<C>(
        control_plane: Arc<C>,
        cache: Arc<dyn ManifestCache>,
        collector: Arc<dyn EnvironmentCollector>,
        downloader: Arc<dyn ArtifactDownloader>,
        manifest: Option<String>,
    ) -> Self
    where
        C: ControlPlane + ReportTransport + 'static,
    {
        let archive = Arc::new(RepositoryArchive::new(control_plane.clone(), manifest));
        Self::new(archive, cache, collector, downloader, control_plane, Arc::new(SystemClock))
    }

    /// Wire the default adapters from runtime configuration.
    ///
    /// # Errors
    ///
    /// [`ManagerError::InvalidConfig`] without an endpoint, or any error
    /// building the HTTP clients.
    pub fn from_config(config: &ManagerConfig) -> ManagerResult<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ManagerError::InvalidConfig("no control plane endpoint configured".to_string())
        })?;

        let control_plane = Arc::new(HttpControlPlane::new(endpoint, config.service_timeout)?);
        let cache = Arc::new(FileManifestCache::new(&config.cache_dir));
        let collector =
            Arc::new(SystemCollector::new().with_overrides(config.host_overrides.clone()));
        let downloader = Arc::new(HttpDownloader::with_timeout(
            &config.download_dir,
            config.download_timeout,
        )?);

        tracing::debug!(
            endpoint,
            archive = %config.archive,
            cache = %config.cache_dir.display(),
            "Creating package service"
        );

        Ok(match config.archive {
            ArchiveKind::Document => {
                Self::with_document_archive(control_plane, cache, collector, downloader)
            }
            ArchiveKind::Repository => Self::with_repository_archive(
                control_plane,
                cache,
                collector,
                downloader,
                config.repository_manifest.clone(),
            ),
        })
    }

    /// Service name of the archive backend.
    pub fn name(&self) -> &str {
        self.archive.name()
    }

    /// Canonical name and version the archive uses for a package.
    pub fn package_arn_and_version(&self, package_name: &str, version: &str) -> (String, String) {
        self.archive.resource_version(package_name, version)
    }

    /// Download the manifest of a package version (or `latest`) and cache it.
    pub fn download_manifest(
        &self,
        tracer: &Tracer,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<ManifestSummary> {
        let resolved = self.store.resolve_manifest(tracer, package_name, version)?;
        Ok(ManifestSummary {
            resource_arn: resolved.resource_arn,
            version: resolved.manifest.version,
            unchanged_from_cache: resolved.unchanged_from_cache,
        })
    }

    /// Download the artifact matching this host and return its local path.
    ///
    /// The manifest cached under exactly `(package_name, version)` is used
    /// when present; otherwise it is downloaded.
    ///
    /// # Errors
    ///
    /// Manifest, [`ManagerError::Environment`], [`ManagerError::NoMatch`],
    /// [`ManagerError::FileNotFound`] and [`ManagerError::DownloadFailed`]
    /// errors.
    pub fn download_artifact(
        &self,
        tracer: &Tracer,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<PathBuf> {
        let file = {
            let mut section = tracer.begin_section("download artifact");
            let result = self.select_file(tracer, &mut section, package_name, version);
            if let Err(e) = &result {
                section.with_error(e);
            }
            result?
        };

        locator::download_artifact(
            self.archive.as_ref(),
            self.downloader.as_ref(),
            tracer,
            &file,
            package_name,
            version,
        )
    }

    fn select_file(
        &self,
        tracer: &Tracer,
        section: &mut super::trace::TraceSection<'_>,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<ResolvedFile> {
        let manifest = match self.store.load_cached_manifest(package_name, version) {
            Ok(manifest) => manifest,
            Err(e) => {
                section.info(format!("error when reading the manifest from cache {}", e));
                tracing::debug!(package = package_name, version, error = %e, "Manifest not cached");
                self.store
                    .resolve_manifest(tracer, package_name, version)?
                    .manifest
            }
        };

        self.find_file(tracer, &manifest)
    }

    fn find_file(&self, tracer: &Tracer, manifest: &Manifest) -> ManagerResult<ResolvedFile> {
        let mut section = tracer.begin_section("resolve package variant");

        let result = self
            .collector
            .collect()
            .map_err(|e| match e {
                ManagerError::Environment(_) => e,
                other => ManagerError::Environment(other.to_string()),
            })
            .and_then(|env| {
                let os = &env.operating_system;
                let variant = resolve_variant(
                    manifest,
                    &os.platform,
                    &os.platform_version,
                    &os.architecture,
                )?;
                locate_file(manifest, variant)
            });

        match &result {
            Ok(file) => {
                section.info(format!("selected {}", file.name));
            }
            Err(e) => {
                section.with_error(e);
            }
        }
        result
    }

    /// Report the outcome of an install, upgrade or uninstall.
    pub fn report_result(&self, tracer: &Tracer, result: &PackageResult) -> ManagerResult<()> {
        self.reporter.report_result(tracer, result)
    }
}
