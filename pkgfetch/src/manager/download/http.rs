//! HTTP-based artifact downloader.
//!
//! Streams the artifact into the download directory and verifies every
//! supported checksum the manifest lists. A file that fails verification is
//! removed.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use sha2::{Digest, Sha256};

use super::checksum::verify_checksums;
use crate::manager::error::{ManagerError, ManagerResult};
use crate::manager::traits::{ArtifactDownloader, DownloadRequest};

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// File name used when a URL has no usable last path segment.
const FALLBACK_FILE_NAME: &str = "artifact";

/// HTTP-based artifact downloader.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
    download_dir: PathBuf,
    pub(crate) timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader writing into `download_dir` with the default timeout.
    pub fn new(download_dir: impl Into<PathBuf>) -> ManagerResult<Self> {
        Self::with_timeout(download_dir, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a downloader with a custom timeout.
    pub fn with_timeout(
        download_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ManagerError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            download_dir: download_dir.into(),
            timeout,
        })
    }

    /// Directory artifacts are written to.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Local path an artifact from `url` is written to.
    ///
    /// Each URL gets its own subdirectory so artifacts sharing a file name
    /// never collide.
    pub fn destination_for(&self, url: &str) -> PathBuf {
        self.download_dir
            .join(url_digest(url))
            .join(file_name_from_url(url))
    }

    /// Stream the response body to `dest`.
    fn stream_download(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        let mut response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                ManagerError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                ManagerError::HttpError(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::HttpError(format!(
                "HTTP {} from {}",
                status, url
            )));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(dest).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| ManagerError::HttpError(format!("Read error: {}", e)))?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| ManagerError::WriteFailed {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            downloaded += bytes_read as u64;
        }

        writer.flush().map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        Ok(downloaded)
    }
}

impl ArtifactDownloader for HttpDownloader {
    fn download(&self, request: &DownloadRequest) -> ManagerResult<PathBuf> {
        let dest = self.destination_for(&request.source_url);
        let bytes = self.stream_download(&request.source_url, &dest)?;

        match verify_checksums(&dest, &request.checksums) {
            Ok(0) => {
                tracing::warn!(
                    url = %request.source_url,
                    "No supported checksum for artifact, accepting unverified"
                );
            }
            Ok(verified) => {
                tracing::debug!(url = %request.source_url, verified, "Checksums verified");
            }
            Err(e) => {
                fs::remove_file(&dest).ok();
                return Err(e);
            }
        }

        tracing::info!(
            url = %request.source_url,
            path = %dest.display(),
            bytes,
            "Artifact downloaded"
        );
        Ok(dest)
    }
}

/// Last path segment of a URL, without query or fragment.
pub fn file_name_from_url(url: &str) -> String {
    let without_suffix = url
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let without_scheme = without_suffix
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_suffix);

    match without_scheme.split_once('/') {
        Some((_, path)) => match path.rsplit('/').next() {
            Some(name) if !name.is_empty() && name != "." && name != ".." => name.to_string(),
            _ => FALLBACK_FILE_NAME.to_string(),
        },
        None => FALLBACK_FILE_NAME.to_string(),
    }
}

fn url_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
