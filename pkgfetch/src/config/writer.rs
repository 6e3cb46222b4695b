//! INI serialization logic for converting `ConfigFile` into the commented
//! text written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let endpoint = config.service.endpoint.as_deref().unwrap_or("");
    let host = &config.host;
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    format!(
        r#"[service]
; Control plane base URL, e.g. https://ssm.us-east-1.amazonaws.com
; Required by every command that talks to the service
endpoint = {}
; Archive backend serving manifests and artifacts:
;   document   - manifest embedded in a document, artifacts as attachments
;   repository - manifest from the package repository, artifacts at their listed location
archive = {}
; Control plane request timeout in seconds
timeout = {}

[cache]
; Directory for cached manifests (one file per package version)
directory = {}

[download]
; Staging directory for downloaded artifacts
directory = {}
; Artifact download timeout in seconds
timeout = {}

[host]
; Host identity overrides. Leave empty to detect at runtime.
; Platform and platform version come from /etc/os-release on Linux.
platform = {}
platform_version = {}
architecture = {}
; Instance attributes attached to result reports
instance_id = {}
instance_type = {}
region = {}
availability_zone = {}

[logging]
; Directory for log files
directory = {}
"#,
        endpoint,
        config.service.archive,
        config.service.timeout,
        path_to_string(&config.cache.directory),
        path_to_string(&config.download.directory),
        config.download.timeout,
        opt(&host.platform),
        opt(&host.platform_version),
        opt(&host.architecture),
        opt(&host.instance_id),
        opt(&host.instance_type),
        opt(&host.region),
        opt(&host.availability_zone),
        path_to_string(&config.logging.directory),
    )
}

/// Render a path, shortening the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::ArchiveKind;

    #[test]
    fn test_writes_every_section() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[service]", "[cache]", "[download]", "[host]", "[logging]"] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert!(content.contains("archive = document"));
        assert!(content.contains("endpoint = \n"));
    }

    #[test]
    fn test_writes_values() {
        let mut config = ConfigFile::default();
        config.service.archive = ArchiveKind::Repository;
        config.host.instance_type = Some("m5.large".to_string());

        let content = to_config_string(&config);
        assert!(content.contains("archive = repository"));
        assert!(content.contains("instance_type = m5.large"));
    }

    #[test]
    fn test_home_paths_use_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("x")), "~/x");
        }
        assert_eq!(path_to_string(Path::new("/opt/x")), "/opt/x");
    }
}
