//! Archive backends serving package manifests and artifacts.
//!
//! Both backends implement [`PackageArchive`] on top of a [`ControlPlane`],
//! the remote API holding documents and package manifests:
//!
//! ```text
//! PackageService
//!       │
//!       └── PackageArchive (trait)
//!               ├── DocumentArchive    ── get_document ──┐
//!               └── RepositoryArchive  ── get_manifest ──┤
//!                                                        │
//!                                    ControlPlane (trait)┘
//!                                          └── HttpControlPlane
//! ```
//!
//! [`PackageArchive`]: crate::manager::PackageArchive

mod document;
mod http;
mod repository;

use serde::{Deserialize, Serialize};

use crate::manager::ManagerResult;

pub use document::{DocumentArchive, DOCUMENT_ARCHIVE_NAME};
pub use http::HttpControlPlane;
pub use repository::{RepositoryArchive, REPOSITORY_ARCHIVE_NAME};

/// Package manifest as returned by the repository API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestResponse {
    /// Raw manifest JSON.
    pub manifest: String,
    /// Canonical ARN of the package; may be empty.
    #[serde(default)]
    pub package_arn: String,
}

/// A downloadable file attached to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// A package document as returned by the document API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentResponse {
    /// Document name or ARN.
    pub name: String,
    pub document_version: String,
    /// Manifest JSON embedded in the document.
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Remote API both archive backends sit on.
pub trait ControlPlane: Send + Sync {
    /// Fetch the manifest of a package version (or `latest`).
    fn get_manifest(&self, package_name: &str, version: &str) -> ManagerResult<ManifestResponse>;

    /// Fetch a package document version (or `latest`).
    fn get_document(&self, name: &str, version: &str) -> ManagerResult<DocumentResponse>;
}
