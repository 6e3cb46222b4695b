//! Blocking HTTP client for the control plane.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET  packages/{name}/manifest[?version=]` - [`ManifestResponse`]
//! - `GET  documents/{name}[?version=]` - [`DocumentResponse`]
//! - `POST results` - [`ResultReport`] body
//!
//! The `version` query parameter is omitted for `latest`. Every failure of a
//! manifest or document fetch, including connection errors and timeouts, is a
//! [`ManagerError::Backend`] naming the package and version.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::{ControlPlane, DocumentResponse, ManifestResponse};
use crate::manager::{
    ManagerError, ManagerResult, ReportTransport, ResultReport, LATEST_VERSION,
};

/// Control plane reached over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpControlPlane {
    /// Create a client for the control plane at `endpoint`.
    ///
    /// # Errors
    ///
    /// [`ManagerError::InvalidConfig`] if `endpoint` is not an absolute http(s)
    /// URL; [`ManagerError::HttpError`] if the client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> ManagerResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ManagerError::InvalidConfig(format!("endpoint '{}': {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(ManagerError::InvalidConfig(format!(
                "endpoint '{}' is not an http(s) URL",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ManagerError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Base URL requests are made against.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a request URL from path segments and an optional version.
    pub(crate) fn url_for(&self, segments: &[&str], version: Option<&str>) -> ManagerResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ManagerError::InvalidConfig(format!(
                    "endpoint '{}' cannot be a base",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        if let Some(version) = version.filter(|v| !v.is_empty() && *v != LATEST_VERSION) {
            url.query_pairs_mut().append_pair("version", version);
        }
        Ok(url)
    }

    fn send_error(&self, url: &Url, e: reqwest::Error) -> ManagerError {
        if e.is_timeout() {
            ManagerError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            ManagerError::HttpError(format!("Request failed: {}", e))
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        package_name: &str,
        version: &str,
    ) -> ManagerResult<T> {
        tracing::debug!(url = %url, "GET");
        let backend = |reason: String| ManagerError::Backend {
            package: package_name.to_string(),
            version: version.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| backend(self.send_error(&url, e).to_string()))?;
        let response = check_status(response).map_err(backend)?;

        response
            .json::<T>()
            .map_err(|e| backend(format!("invalid response from {}: {}", url, e)))
    }
}

/// Pass successful responses through; describe the others.
fn check_status(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        Err(format!("HTTP {} from {}", status, url))
    } else {
        Err(format!("HTTP {} from {}: {}", status, url, body))
    }
}

impl ControlPlane for HttpControlPlane {
    fn get_manifest(&self, package_name: &str, version: &str) -> ManagerResult<ManifestResponse> {
        let url = self.url_for(&["packages", package_name, "manifest"], Some(version))?;
        self.get_json(url, package_name, version)
    }

    fn get_document(&self, name: &str, version: &str) -> ManagerResult<DocumentResponse> {
        let url = self.url_for(&["documents", name], Some(version))?;
        self.get_json(url, name, version)
    }
}

impl ReportTransport for HttpControlPlane {
    fn submit(&self, report: &ResultReport) -> ManagerResult<()> {
        let url = self.url_for(&["results"], None)?;
        tracing::debug!(url = %url, package = %report.package_name, "POST result report");

        let response = self
            .client
            .post(url.clone())
            .json(report)
            .send()
            .map_err(|e| self.send_error(&url, e))?;
        check_status(response).map_err(ManagerError::HttpError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> HttpControlPlane {
        HttpControlPlane::new(endpoint, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_invalid_endpoints() {
        for endpoint in ["not a url", "ftp://example.com", "mailto:ops@example.com"] {
            assert!(
                matches!(
                    HttpControlPlane::new(endpoint, Duration::from_secs(1)),
                    Err(ManagerError::InvalidConfig(_))
                ),
                "{} should be rejected",
                endpoint
            );
        }
    }

    #[test]
    fn test_manifest_url_encodes_arn() {
        let cp = client("https://cp.example.com/v1/");
        let url = cp
            .url_for(
                &["packages", "arn:aws:ssm:::package/Tool", "manifest"],
                Some("1.2.0"),
            )
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://cp.example.com/v1/packages/arn:aws:ssm:::package%2FTool/manifest?version=1.2.0"
        );
    }

    #[test]
    fn test_latest_omits_version() {
        let cp = client("https://cp.example.com");
        let url = cp.url_for(&["documents", "Tool"], Some(LATEST_VERSION)).unwrap();
        assert_eq!(url.as_str(), "https://cp.example.com/documents/Tool");
    }

    #[test]
    fn test_unreachable_control_plane_is_backend_error() {
        let cp = client("http://127.0.0.1:9");

        match cp.get_manifest("Tool", "1.2.0") {
            Err(ManagerError::Backend {
                package,
                version,
                reason,
            }) => {
                assert_eq!(package, "Tool");
                assert_eq!(version, "1.2.0");
                assert!(!reason.is_empty());
            }
            other => panic!("Expected Backend, got {:?}", other),
        }

        assert!(matches!(
            cp.get_document("Tool", LATEST_VERSION),
            Err(ManagerError::Backend { .. })
        ));
    }

    #[test]
    fn test_unreachable_report_endpoint_is_transport_error() {
        let cp = client("http://127.0.0.1:9");
        let report = ResultReport {
            package_name: "Tool".to_string(),
            package_version: "1.2.0".to_string(),
            previous_package_version: None,
            operation: "Install".to_string(),
            overall_timing: 0,
            result: 0,
            attributes: Default::default(),
            steps: Vec::new(),
        };
        assert!(cp.submit(&report).is_err());
    }
}
