//! Settings structs for every configuration section.
//!
//! Each struct represents one `[section]` of the INI file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default control plane request timeout in seconds.
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;

/// Default artifact download timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Which archive backend serves manifests and artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Manifests embedded in documents, artifacts as document attachments.
    #[default]
    Document,
    /// Manifests from the package repository, artifacts at their listed location.
    Repository,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Repository => "repository",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "repository" => Ok(Self::Repository),
            other => Err(format!("unknown archive '{}'", other)),
        }
    }
}

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub service: ServiceSettings,
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub host: HostSettings,
    pub logging: LoggingSettings,
}

/// Control plane settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Control plane base URL. Required for any remote operation.
    pub endpoint: Option<String>,
    pub archive: ArchiveKind,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            archive: ArchiveKind::default(),
            timeout: DEFAULT_SERVICE_TIMEOUT_SECS,
        }
    }
}

/// Manifest cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
        }
    }
}

/// Artifact download settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Staging directory artifacts are written to.
    pub directory: PathBuf,
    /// Download timeout in seconds.
    pub timeout: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            directory: default_download_dir(),
            timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

/// Host identity overrides. Unset fields are detected at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub architecture: Option<String>,
    pub instance_id: Option<String>,
    pub instance_type: Option<String>,
    pub region: Option<String>,
    pub availability_zone: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::config_directory().join("logs"),
        }
    }
}

/// Default manifest cache directory (`<platform cache dir>/pkgfetch/manifests`).
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| super::config_directory().join("cache"))
        .join("pkgfetch")
        .join("manifests")
}

/// Default artifact staging directory.
pub fn default_download_dir() -> PathBuf {
    std::env::temp_dir().join("pkgfetch-downloads")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_kind_parse() {
        assert_eq!("document".parse::<ArchiveKind>(), Ok(ArchiveKind::Document));
        assert_eq!(" Repository ".parse::<ArchiveKind>(), Ok(ArchiveKind::Repository));
        assert!("s3".parse::<ArchiveKind>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert!(config.service.endpoint.is_none());
        assert_eq!(config.service.archive, ArchiveKind::Document);
        assert_eq!(config.service.timeout, DEFAULT_SERVICE_TIMEOUT_SECS);
        assert_eq!(config.download.timeout, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        assert!(config.cache.directory.ends_with("pkgfetch/manifests"));
        assert_eq!(config.host, HostSettings::default());
    }
}
