//! Artifact file lookup and download orchestration.

use std::path::PathBuf;

use super::error::{ManagerError, ManagerResult};
use super::manifest::{Manifest, PackageVariant, ResolvedFile};
use super::trace::Tracer;
use super::traits::{ArtifactDownloader, DownloadRequest, PackageArchive};

/// Find the file table entry a package variant names.
///
/// # Errors
///
/// Returns [`ManagerError::FileNotFound`] if the manifest has no such file.
pub fn locate_file(manifest: &Manifest, variant: &PackageVariant) -> ManagerResult<ResolvedFile> {
    manifest
        .files
        .get(&variant.file_name)
        .map(|info| ResolvedFile {
            name: variant.file_name.clone(),
            info: info.clone(),
        })
        .ok_or_else(|| ManagerError::FileNotFound {
            file_name: variant.file_name.clone(),
        })
}

/// Download a resolved file through the archive's download location.
///
/// The downloader verifies the file's checksums. Nothing is retried and a
/// partially written file is left to the downloader.
///
/// # Errors
///
/// Location lookup errors are returned as-is. A downloader failure, or a
/// download that produced no path, is [`ManagerError::DownloadFailed`]
/// carrying the source URL.
pub fn download_artifact(
    archive: &dyn PackageArchive,
    downloader: &dyn ArtifactDownloader,
    tracer: &Tracer,
    file: &ResolvedFile,
    package_name: &str,
    version: &str,
) -> ManagerResult<PathBuf> {
    let mut section = tracer.begin_section(format!("download {}", file.name));

    let result = fetch(archive, downloader, file, package_name, version);
    match &result {
        Ok(path) => {
            section.info(format!("downloaded to {}", path.display()));
        }
        Err(e) => {
            section.with_error(e);
        }
    }
    result
}

fn fetch(
    archive: &dyn PackageArchive,
    downloader: &dyn ArtifactDownloader,
    file: &ResolvedFile,
    package_name: &str,
    version: &str,
) -> ManagerResult<PathBuf> {
    let source_url = archive.download_location(file, package_name, version)?;
    let request = DownloadRequest {
        source_url: source_url.clone(),
        checksums: file.info.checksums.clone(),
    };

    tracing::info!(
        package = package_name,
        version = version,
        file = %file.name,
        url = %source_url,
        "Downloading artifact"
    );

    match downloader.download(&request) {
        Ok(path) if path.as_os_str().is_empty() => Err(ManagerError::DownloadFailed {
            url: source_url,
            reason: None,
        }),
        Ok(path) => Ok(path),
        Err(e) => Err(ManagerError::DownloadFailed {
            url: source_url,
            reason: Some(e.to_string()),
        }),
    }
}
