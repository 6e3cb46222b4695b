//! Package manifest model and decoding.
//!
//! A manifest describes one version of a package: the selector tree that maps
//! a host's platform, platform version and architecture to a package variant,
//! and the file table holding the checksums of every downloadable artifact.
//!
//! ```text
//! {
//!   "schemaVersion": "2.0",
//!   "version": "1.2.0",
//!   "packages": {
//!     "linux": { "_any": { "x86_64": { "file": "pkg-linux.zip" } } }
//!   },
//!   "files": {
//!     "pkg-linux.zip": { "checksums": { "sha256": "…" } }
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{ManagerError, ManagerResult};

/// Reserved selector key matching any value at its level.
pub const ANY_SELECTOR: &str = "_any";

/// Architecture level of the selector tree.
pub type ArchitectureSelectors = HashMap<String, PackageVariant>;

/// Platform version level of the selector tree.
pub type VersionSelectors = HashMap<String, ArchitectureSelectors>;

/// Full selector tree: platform -> platform version -> architecture.
pub type SelectorTree = HashMap<String, VersionSelectors>;

/// Parsed package manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema_version: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub packages: SelectorTree,

    #[serde(default)]
    pub files: HashMap<String, FileInfo>,
}

/// Package descriptor selected for a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVariant {
    /// Key into the manifest's file table. A variant without one decodes
    /// with an empty name and fails lookup only for hosts that select it.
    #[serde(rename = "file", alias = "fileName", default)]
    pub file_name: String,
}

/// Integrity and location data for a downloadable file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Algorithm name (e.g. `sha256`) to lowercase hex digest.
    #[serde(default)]
    pub checksums: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A file table entry bound to its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub name: String,
    pub info: FileInfo,
}

impl Manifest {
    /// Whether the selector tree is empty.
    pub fn has_packages(&self) -> bool {
        !self.packages.is_empty()
    }
}

/// Decode manifest bytes.
///
/// Unknown fields are ignored; a missing `packages` or `files` field decodes
/// as an empty map.
pub fn parse_manifest(data: &[u8]) -> ManagerResult<Manifest> {
    serde_json::from_slice(data).map_err(|e| ManagerError::Decode {
        reason: e.to_string(),
    })
}
