//! Package manifest resolution, artifact download and result reporting.
//!
//! # Overview
//!
//! The manager decides which variant of a versioned package a host installs
//! and acquires it:
//! - Downloading package manifests and detecting changes against the cache
//! - Resolving the host's platform, platform version and architecture
//!   against the manifest's selector tree
//! - Locating and downloading the selected artifact with checksum checks
//! - Reporting install, upgrade and uninstall outcomes
//!
//! # Architecture
//!
//! The manager uses trait-based abstractions for testability:
//!
//! - [`PackageArchive`] - Serves manifests and artifact locations
//! - [`ManifestCache`] - Stores raw manifest bytes
//! - [`EnvironmentCollector`] - Describes the host
//! - [`ArtifactDownloader`] - Downloads and verifies artifacts
//! - [`ReportTransport`] - Accepts result reports
//! - [`NanoTime`] - Supplies the current time
//!
//! # Example
//!
//! ```no_run
//! use pkgfetch::manager::{ManagerConfig, PackageService, Tracer};
//!
//! let config = ManagerConfig::new("https://ssm.us-east-1.amazonaws.com");
//! let service = PackageService::from_config(&config)?;
//!
//! let tracer = Tracer::default();
//! let summary = service.download_manifest(&tracer, "AmazonCloudWatchAgent", "latest")?;
//! let path = service.download_artifact(&tracer, "AmazonCloudWatchAgent", &summary.version)?;
//! println!("artifact at {}", path.display());
//! # Ok::<(), pkgfetch::manager::ManagerError>(())
//! ```

mod cache;
mod clock;
mod config;
mod download;
mod environment;
mod error;
mod locator;
mod manifest;
mod reporter;
mod selector;
mod service;
mod store;
mod trace;
mod traits;

#[cfg(test)]
mod mocks;

pub use cache::{FileManifestCache, MemoryManifestCache};
pub use clock::{elapsed_millis, NanoTime, SystemClock};
pub use config::ManagerConfig;
pub use download::{
    calculate_file_checksum, file_name_from_url, verify_checksums, ChecksumAlgorithm,
    HttpDownloader,
};
pub use environment::{
    normalize_architecture, parse_os_release, EnvironmentCollector, HostEnvironment,
    InstanceInfo, OperatingSystem, StaticCollector, SystemCollector,
};
pub use error::{ManagerError, ManagerResult};
pub use locator::{download_artifact, locate_file};
pub use manifest::{
    parse_manifest, FileInfo, Manifest, PackageVariant, ResolvedFile, SelectorTree, ANY_SELECTOR,
};
pub use reporter::{PackageResult, ReportStep, ResultReport, ResultReporter, ResultStep};
pub use selector::{
    match_architecture, match_platform, match_platform_version, resolve_variant, SelectorLevel,
};
pub use service::{ManifestSummary, PackageService};
pub use store::{ManifestStore, ResolvedManifest};
pub use trace::{TraceEntry, TraceSection, Tracer, EXIT_FAILURE, EXIT_SUCCESS};
pub use traits::{
    ArtifactDownloader, DownloadRequest, ManifestCache, PackageArchive, ReportTransport,
    LATEST_VERSION,
};
