//! In-memory fakes of the collaborator traits for unit tests.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::environment::{EnvironmentCollector, HostEnvironment};
use super::error::{ManagerError, ManagerResult};
use super::manifest::{Manifest, ResolvedFile};
use super::reporter::ResultReport;
use super::traits::{
    ArtifactDownloader, DownloadRequest, ManifestCache, PackageArchive, ReportTransport,
};

/// Archive serving one fixed manifest.
pub struct MockArchive {
    resource_arn: String,
    manifest: Option<String>,
    downloads: AtomicUsize,
}

impl MockArchive {
    pub fn new(resource_arn: &str, manifest_json: &str) -> Self {
        Self {
            resource_arn: resource_arn.to_string(),
            manifest: Some(manifest_json.to_string()),
            downloads: AtomicUsize::new(0),
        }
    }

    /// Archive whose manifest downloads always fail.
    pub fn failing(resource_arn: &str) -> Self {
        Self {
            resource_arn: resource_arn.to_string(),
            manifest: None,
            downloads: AtomicUsize::new(0),
        }
    }

    /// Number of manifest downloads attempted.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl PackageArchive for MockArchive {
    fn name(&self) -> &str {
        "mock"
    }

    fn download_manifest_bytes(&self, package_name: &str, version: &str) -> ManagerResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.manifest
            .as_ref()
            .map(|m| m.as_bytes().to_vec())
            .ok_or_else(|| ManagerError::Backend {
                package: package_name.to_string(),
                version: version.to_string(),
                reason: "service unavailable".to_string(),
            })
    }

    fn resource_identifier(&self, _manifest: &Manifest) -> String {
        self.resource_arn.clone()
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
        Ok(format!(
            "https://packages.example.com/{}/{}/{}",
            package_name, version, file.name
        ))
    }
}

/// Cache failing on reads, writes, or both.
pub struct FailingCache {
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingCache {
    /// Reads fail with an I/O error; writes succeed and are discarded.
    pub fn read_only_failure() -> Self {
        Self {
            fail_reads: true,
            fail_writes: false,
        }
    }

    /// Reads miss; writes fail.
    pub fn write_failure() -> Self {
        Self {
            fail_reads: false,
            fail_writes: true,
        }
    }
}

impl ManifestCache for FailingCache {
    fn read_manifest(&self, resource: &str, version: &str) -> ManagerResult<Vec<u8>> {
        if self.fail_reads {
            Err(ManagerError::ReadFailed {
                path: PathBuf::from(format!("/cache/{}/{}", resource, version)),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            })
        } else {
            Err(ManagerError::CacheMiss {
                resource: resource.to_string(),
                version: version.to_string(),
            })
        }
    }

    fn write_manifest(&self, resource: &str, version: &str, _data: &[u8]) -> ManagerResult<()> {
        if self.fail_writes {
            Err(ManagerError::WriteFailed {
                path: PathBuf::from(format!("/cache/{}/{}", resource, version)),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            })
        } else {
            Ok(())
        }
    }
}

/// Downloader recording requests and answering with a fixed outcome.
pub struct RecordingDownloader {
    outcome: Result<PathBuf, String>,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl RecordingDownloader {
    pub fn returning(path: impl Into<PathBuf>) -> Self {
        Self {
            outcome: Ok(path.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().clone()
    }
}

impl ArtifactDownloader for RecordingDownloader {
    fn download(&self, request: &DownloadRequest) -> ManagerResult<PathBuf> {
        self.requests.lock().push(request.clone());
        self.outcome
            .clone()
            .map_err(ManagerError::HttpError)
    }
}

/// Transport recording submitted reports.
#[derive(Default)]
pub struct RecordingTransport {
    fail: bool,
    reports: Mutex<Vec<ResultReport>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn reports(&self) -> Vec<ResultReport> {
        self.reports.lock().clone()
    }
}

impl ReportTransport for RecordingTransport {
    fn submit(&self, report: &ResultReport) -> ManagerResult<()> {
        if self.fail {
            return Err(ManagerError::HttpError("HTTP 503 Service Unavailable".to_string()));
        }
        self.reports.lock().push(report.clone());
        Ok(())
    }
}

/// Collector that always fails.
pub struct FailingCollector;

impl EnvironmentCollector for FailingCollector {
    fn collect(&self) -> ManagerResult<HostEnvironment> {
        Err(ManagerError::Environment("metadata service unreachable".to_string()))
    }
}
