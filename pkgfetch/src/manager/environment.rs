//! Host environment detection.
//!
//! The selector tree is keyed by the host's platform name, platform version
//! and CPU architecture; result reports additionally carry the instance
//! attributes of the host.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::error::{ManagerError, ManagerResult};

/// Default location of the os-release file on Linux.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Operating system identity used for variant selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatingSystem {
    pub platform: String,
    pub platform_version: String,
    pub architecture: String,
}

/// Cloud instance attributes of the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub instance_type: String,
    pub region: String,
    pub availability_zone: String,
}

/// Everything known about the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    pub operating_system: OperatingSystem,
    pub instance: InstanceInfo,
}

impl HostEnvironment {
    /// Flat attribute map carried by result reports.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let os = &self.operating_system;
        let instance = &self.instance;
        [
            ("platformName", &os.platform),
            ("platformVersion", &os.platform_version),
            ("architecture", &os.architecture),
            ("instanceID", &instance.instance_id),
            ("instanceType", &instance.instance_type),
            ("region", &instance.region),
            ("availabilityZone", &instance.availability_zone),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// Source of host environment data.
pub trait EnvironmentCollector: Send + Sync {
    fn collect(&self) -> ManagerResult<HostEnvironment>;
}

/// Collector returning a fixed environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCollector {
    environment: HostEnvironment,
}

impl StaticCollector {
    pub fn new(environment: HostEnvironment) -> Self {
        Self { environment }
    }
}

impl EnvironmentCollector for StaticCollector {
    fn collect(&self) -> ManagerResult<HostEnvironment> {
        Ok(self.environment.clone())
    }
}

/// Collector reading the running system.
///
/// On Linux the platform and version come from the `ID` and `VERSION_ID`
/// fields of os-release; elsewhere the platform is the Rust target OS and the
/// version is left empty. Any field set in the overrides wins over detection.
/// Instance attributes are never probed and come from the overrides only.
#[derive(Debug, Clone)]
pub struct SystemCollector {
    os_release_path: PathBuf,
    overrides: HostEnvironment,
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCollector {
    pub fn new() -> Self {
        Self {
            os_release_path: PathBuf::from(OS_RELEASE_PATH),
            overrides: HostEnvironment::default(),
        }
    }

    /// Set fields that take precedence over detection.
    pub fn with_overrides(mut self, overrides: HostEnvironment) -> Self {
        self.overrides = overrides;
        self
    }

    /// Read os-release from a different path.
    pub fn with_os_release_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.os_release_path = path.into();
        self
    }

    fn detect_operating_system(&self) -> ManagerResult<OperatingSystem> {
        let architecture = normalize_architecture(std::env::consts::ARCH).to_string();

        if std::env::consts::OS != "linux" {
            return Ok(OperatingSystem {
                platform: std::env::consts::OS.to_string(),
                platform_version: String::new(),
                architecture,
            });
        }

        let content = fs::read_to_string(&self.os_release_path).map_err(|e| {
            ManagerError::Environment(format!(
                "cannot read {}: {}",
                self.os_release_path.display(),
                e
            ))
        })?;
        let (platform, platform_version) = parse_os_release(&content);

        Ok(OperatingSystem {
            platform: platform.unwrap_or_else(|| "linux".to_string()),
            platform_version: platform_version.unwrap_or_default(),
            architecture,
        })
    }

    fn os_fully_overridden(&self) -> bool {
        let os = &self.overrides.operating_system;
        !os.platform.is_empty() && !os.platform_version.is_empty() && !os.architecture.is_empty()
    }
}

impl EnvironmentCollector for SystemCollector {
    fn collect(&self) -> ManagerResult<HostEnvironment> {
        let detected = if self.os_fully_overridden() {
            OperatingSystem::default()
        } else {
            self.detect_operating_system()?
        };

        let o = &self.overrides.operating_system;
        let pick = |over: &str, det: String| {
            if over.is_empty() {
                det
            } else {
                over.to_string()
            }
        };

        Ok(HostEnvironment {
            operating_system: OperatingSystem {
                platform: pick(&o.platform, detected.platform),
                platform_version: pick(&o.platform_version, detected.platform_version),
                architecture: pick(&o.architecture, detected.architecture),
            },
            instance: self.overrides.instance.clone(),
        })
    }
}

/// Extract `ID` and `VERSION_ID` from os-release content.
pub fn parse_os_release(content: &str) -> (Option<String>, Option<String>) {
    let mut id = None;
    let mut version_id = None;

    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(value.trim_matches('"').to_lowercase());
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version_id = Some(value.trim_matches('"').to_string());
        }
    }

    (id, version_id)
}

/// Map Rust architecture names onto the names used in selector trees.
pub fn normalize_architecture(arch: &str) -> &str {
    match arch {
        "aarch64" => "arm64",
        "x86" => "i386",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const UBUNTU: &str = r#"NAME="Ubuntu"
VERSION="22.04.3 LTS (Jammy Jellyfish)"
ID=ubuntu
ID_LIKE=debian
VERSION_ID="22.04"
"#;

    #[test]
    fn test_parse_os_release() {
        let (id, version) = parse_os_release(UBUNTU);
        assert_eq!(id.as_deref(), Some("ubuntu"));
        assert_eq!(version.as_deref(), Some("22.04"));
    }

    #[test]
    fn test_parse_os_release_missing_fields() {
        let (id, version) = parse_os_release("NAME=Something\n");
        assert!(id.is_none());
        assert!(version.is_none());
    }

    #[test]
    fn test_normalize_architecture() {
        assert_eq!(normalize_architecture("aarch64"), "arm64");
        assert_eq!(normalize_architecture("x86_64"), "x86_64");
        assert_eq!(normalize_architecture("x86"), "i386");
    }

    #[test]
    fn test_attributes_keys() {
        let env = HostEnvironment {
            operating_system: OperatingSystem {
                platform: "ubuntu".to_string(),
                platform_version: "22.04".to_string(),
                architecture: "x86_64".to_string(),
            },
            instance: InstanceInfo {
                instance_id: "i-123".to_string(),
                instance_type: "t3.micro".to_string(),
                region: "us-east-1".to_string(),
                availability_zone: "us-east-1a".to_string(),
            },
        };

        let attrs = env.attributes();
        assert_eq!(attrs.len(), 7);
        assert_eq!(attrs["platformName"], "ubuntu");
        assert_eq!(attrs["platformVersion"], "22.04");
        assert_eq!(attrs["architecture"], "x86_64");
        assert_eq!(attrs["instanceID"], "i-123");
        assert_eq!(attrs["instanceType"], "t3.micro");
        assert_eq!(attrs["region"], "us-east-1");
        assert_eq!(attrs["availabilityZone"], "us-east-1a");
    }

    #[test]
    fn test_full_override_skips_detection() {
        let overrides = HostEnvironment {
            operating_system: OperatingSystem {
                platform: "windows".to_string(),
                platform_version: "10".to_string(),
                architecture: "x86_64".to_string(),
            },
            instance: InstanceInfo {
                region: "eu-west-1".to_string(),
                ..Default::default()
            },
        };
        let collector = SystemCollector::new()
            .with_os_release_path("/nonexistent/os-release")
            .with_overrides(overrides.clone());

        assert_eq!(collector.collect().unwrap(), overrides);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_detection_reads_os_release() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(UBUNTU.as_bytes()).unwrap();

        let collector = SystemCollector::new().with_os_release_path(file.path());
        let env = collector.collect().unwrap();

        assert_eq!(env.operating_system.platform, "ubuntu");
        assert_eq!(env.operating_system.platform_version, "22.04");
        assert_eq!(
            env.operating_system.architecture,
            normalize_architecture(std::env::consts::ARCH)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_missing_os_release_is_error() {
        let collector = SystemCollector::new().with_os_release_path("/nonexistent/os-release");
        assert!(matches!(
            collector.collect(),
            Err(ManagerError::Environment(_))
        ));
    }

    #[test]
    fn test_static_collector() {
        let env = HostEnvironment::default();
        assert_eq!(StaticCollector::new(env.clone()).collect().unwrap(), env);
    }
}
