//! Artifact download and checksum verification.
//!
//! - `http` - [`HttpDownloader`], the default [`ArtifactDownloader`]
//!   implementation
//! - `checksum` - SHA-256 and SHA-512 file digests
//!
//! [`ArtifactDownloader`]: crate::manager::traits::ArtifactDownloader

mod checksum;
mod http;

pub use checksum::{calculate_file_checksum, verify_checksums, ChecksumAlgorithm};
pub use http::{file_name_from_url, HttpDownloader};
