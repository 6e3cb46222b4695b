//! Archive backend reading packages from the package repository.
//!
//! Each file entry of a repository manifest carries its own download
//! location. A manifest may also be supplied up front, in which case the
//! control plane is never asked for it.

use std::sync::Arc;

use parking_lot::Mutex;

use super::ControlPlane;
use crate::manager::{Manifest, ManagerError, ManagerResult, PackageArchive, ResolvedFile};

/// Service name of the repository archive.
pub const REPOSITORY_ARCHIVE_NAME: &str = "repository";

/// [`PackageArchive`] over the package repository API.
pub struct RepositoryArchive {
    control_plane: Arc<dyn ControlPlane>,
    supplied_manifest: Option<String>,
    /// Resource identifier of the last fetched manifest.
    resource_arn: Mutex<String>,
}

impl RepositoryArchive {
    /// Create an archive, optionally with the manifest already in hand.
    ///
    /// An empty supplied manifest counts as absent.
    pub fn new(control_plane: Arc<dyn ControlPlane>, manifest: Option<String>) -> Self {
        Self {
            control_plane,
            supplied_manifest: manifest.filter(|m| !m.trim().is_empty()),
            resource_arn: Mutex::new(String::new()),
        }
    }
}

impl PackageArchive for RepositoryArchive {
    fn name(&self) -> &str {
        REPOSITORY_ARCHIVE_NAME
    }

    fn download_manifest_bytes(&self, package_name: &str, version: &str) -> ManagerResult<Vec<u8>> {
        if let Some(manifest) = &self.supplied_manifest {
            tracing::debug!(package = package_name, "Using supplied manifest");
            *self.resource_arn.lock() = package_name.to_string();
            return Ok(manifest.clone().into_bytes());
        }

        let response = self.control_plane.get_manifest(package_name, version)?;
        let arn = if response.package_arn.is_empty() {
            package_name.to_string()
        } else {
            response.package_arn
        };
        tracing::debug!(package = package_name, resource = %arn, "Fetched repository manifest");

        *self.resource_arn.lock() = arn;
        Ok(response.manifest.into_bytes())
    }

    fn resource_identifier(&self, _manifest: &Manifest) -> String {
        self.resource_arn.lock().clone()
    }

    fn resource_version(&self, package_name: &str, version: &str) -> (String, String) {
        (package_name.to_string(), version.to_string())
    }

    fn download_location(
        &self,
        file: &ResolvedFile,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<String> {
        file.info
            .download_location
            .clone()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ManagerError::Backend {
                package: package_name.to_string(),
                version: version.to_string(),
                reason: format!("file {} has no download location", file.name),
            })
    }
}
