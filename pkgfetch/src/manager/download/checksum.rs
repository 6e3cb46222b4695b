//! Checksum calculation for downloaded artifacts.
//!
//! Manifests list one or more digests per file keyed by algorithm name.
//! `sha256` and `sha512` are verified; other algorithms are skipped.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256, Sha512};

use crate::manager::error::{ManagerError, ManagerResult};

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Parse a manifest algorithm name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Calculate the lowercase hex digest of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn calculate_file_checksum(path: &Path, algorithm: ChecksumAlgorithm) -> ManagerResult<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => hash_file::<Sha256>(path),
        ChecksumAlgorithm::Sha512 => hash_file::<Sha512>(path),
    }
}

fn hash_file<D: Digest>(path: &Path) -> ManagerResult<String> {
    let read_failed = |e| ManagerError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = File::open(path).map_err(read_failed)?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(read_failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

/// Verify a file against every supported checksum in `expected`.
///
/// Returns the number of digests that were checked. Zero means the manifest
/// listed no supported algorithm and nothing was verified.
///
/// # Errors
///
/// Returns [`ManagerError::ChecksumMismatch`] on the first digest that
/// differs, or a read error.
pub fn verify_checksums(path: &Path, expected: &HashMap<String, String>) -> ManagerResult<usize> {
    let mut verified = 0;

    for (name, digest) in expected {
        let Some(algorithm) = ChecksumAlgorithm::from_name(name) else {
            tracing::debug!(algorithm = %name, "Skipping unsupported checksum algorithm");
            continue;
        };

        let actual = calculate_file_checksum(path, algorithm)?;
        if !actual.eq_ignore_ascii_case(digest.trim()) {
            return Err(ManagerError::ChecksumMismatch {
                filename: path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                algorithm: algorithm.to_string(),
                expected: digest.clone(),
                actual,
            });
        }
        verified += 1;
    }

    Ok(verified)
}
