//! Archive backend reading packages from documents.
//!
//! The manifest is the document content and artifacts are attachments of the
//! same document. The document's name and version returned by the control
//! plane become the cache key and the canonical package identity.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Attachment, ControlPlane, DocumentResponse};
use crate::manager::{
    Manifest, ManagerError, ManagerResult, PackageArchive, ResolvedFile, LATEST_VERSION,
};

/// Service name of the document archive.
pub const DOCUMENT_ARCHIVE_NAME: &str = "document";

/// The last document fetched.
#[derive(Debug, Clone)]
struct FetchedDocument {
    requested_name: String,
    requested_version: String,
    name: String,
    document_version: String,
    attachments: Vec<Attachment>,
}

impl FetchedDocument {
    fn answers(&self, package_name: &str, version: &str) -> bool {
        let same_package = package_name == self.requested_name || package_name == self.name;
        let same_version = version == self.requested_version
            || version == self.document_version
            || (version.is_empty() && self.requested_version == LATEST_VERSION);
        same_package && same_version
    }
}

/// [`PackageArchive`] over package documents.
pub struct DocumentArchive {
    control_plane: Arc<dyn ControlPlane>,
    fetched: Mutex<Option<FetchedDocument>>,
}

impl DocumentArchive {
    pub fn new(control_plane: Arc<dyn ControlPlane>) -> Self {
        Self {
            control_plane,
            fetched: Mutex::new(None),
        }
    }

    fn fetch(&self, package_name: &str, version: &str) -> ManagerResult<DocumentResponse> {
        let document = self.control_plane.get_document(package_name, version)?;
        tracing::debug!(
            package = package_name,
            document = %document.name,
            document_version = %document.document_version,
            attachments = document.attachments.len(),
            "Fetched package document"
        );

        *self.fetched.lock() = Some(FetchedDocument {
            requested_name: package_name.to_string(),
            requested_version: version.to_string(),
            name: document.name.clone(),
            document_version: document.document_version.clone(),
            attachments: document.attachments.clone(),
        });
        Ok(document)
    }

    fn attachments_for(&self, package_name: &str, version: &str) -> ManagerResult<Vec<Attachment>> {
        if let Some(fetched) = self.fetched.lock().as_ref() {
            if fetched.answers(package_name, version) {
                return Ok(fetched.attachments.clone());
            }
        }
        Ok(self.fetch(package_name, version)?.attachments)
    }
}

impl PackageArchive for DocumentArchive {
    fn name(&self) -> &str {
        DOCUMENT_ARCHIVE_NAME
    }

    fn download_manifest_bytes(&self, package_name: &str, version: &str) -> ManagerResult<Vec<u8>> {
        let document = self.fetch(package_name, version)?;
        Ok(document.content.into_bytes())
    }

    fn resource_identifier(&self, _manifest: &Manifest) -> String {
        self.fetched
            .lock()
            .as_ref()
            .map(|f| {
                if f.name.is_empty() {
                    f.requested_name.clone()
                } else {
                    f.name.clone()
                }
            })
            .unwrap_or_default()
    }

    fn resource_version(&self, package_name: &str, version: &str) -> (String, String) {
        match self.fetched.lock().as_ref() {
            Some(f) if f.answers(package_name, version) && !f.name.is_empty() => {
                (f.name.clone(), f.document_version.clone())
            }
            _ => (package_name.to_string(), version.to_string()),
        }
    }

    fn download_location(
        &self,
        file: &ResolvedFile,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<String> {
        self.attachments_for(package_name, version)?
            .into_iter()
            .find(|a| a.name == file.name)
            .map(|a| a.url)
            .ok_or_else(|| ManagerError::Backend {
                package: package_name.to_string(),
                version: version.to_string(),
                reason: format!("document has no attachment named {}", file.name),
            })
    }
}
