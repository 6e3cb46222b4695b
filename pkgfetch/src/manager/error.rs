//! Error types for the package service.

use std::io;
use std::path::PathBuf;

use super::selector::SelectorLevel;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur while resolving, downloading or reporting on packages.
#[derive(Debug)]
pub enum ManagerError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file or directory.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Manifest bytes are not a valid manifest document.
    Decode { reason: String },

    /// No cached manifest exists for the key.
    CacheMiss { resource: String, version: String },

    /// Persisting manifest bytes to the cache failed.
    CacheWrite {
        resource: String,
        version: String,
        reason: String,
    },

    /// The selector tree has no entry for the host.
    NoMatch {
        platform: String,
        platform_version: String,
        architecture: String,
        level: SelectorLevel,
    },

    /// A package variant references a file missing from the file table.
    FileNotFound { file_name: String },

    /// The downloader failed or produced no local file.
    DownloadFailed { url: String, reason: Option<String> },

    /// Checksum verification failed.
    ChecksumMismatch {
        filename: String,
        algorithm: String,
        expected: String,
        actual: String,
    },

    /// The remote transport rejected the result report.
    ReportSubmission { reason: String },

    /// The archive backend failed.
    Backend {
        package: String,
        version: String,
        reason: String,
    },

    /// Host environment detection failed.
    Environment(String),

    /// Invalid configuration.
    InvalidConfig(String),

    /// HTTP request failed.
    HttpError(String),

    /// Network timeout.
    Timeout { url: String, timeout_secs: u64 },
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Decode { reason } => write!(f, "failed to decode manifest: {}", reason),
            Self::CacheMiss { resource, version } => {
                write!(f, "no cached manifest for {} version {}", resource, version)
            }
            Self::CacheWrite {
                resource,
                version,
                reason,
            } => {
                write!(
                    f,
                    "failed to write manifest for {} version {} to cache: {}",
                    resource, version, reason
                )
            }
            Self::NoMatch {
                platform,
                platform_version,
                architecture,
                level,
            } => {
                write!(
                    f,
                    "no manifest found for platform: {}, version {}, architecture {} (no {} entry)",
                    platform, platform_version, architecture, level
                )
            }
            Self::FileNotFound { file_name } => {
                write!(f, "failed to find file {} in manifest", file_name)
            }
            Self::DownloadFailed { url, reason } => {
                write!(
                    f,
                    "failed to download installation package reliably, {}",
                    url
                )?;
                if let Some(reason) = reason {
                    write!(f, ", {}", reason)?;
                }
                Ok(())
            }
            Self::ChecksumMismatch {
                filename,
                algorithm,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{} checksum mismatch for {}: expected {}, got {}",
                    algorithm, filename, expected, actual
                )
            }
            Self::ReportSubmission { reason } => {
                write!(f, "failed to report results: {}", reason)
            }
            Self::Backend {
                package,
                version,
                reason,
            } => {
                write!(
                    f,
                    "archive backend failed for {} version {}: {}",
                    package, version, reason
                )
            }
            Self::Environment(msg) => write!(f, "failed to collect host data: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
