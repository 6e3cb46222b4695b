//! INI parsing logic for converting `Ini` into `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::{ArchiveKind, ConfigFile};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [service] section
    if let Some(section) = ini.section(Some("service")) {
        if let Some(v) = non_empty(section, "endpoint") {
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid(
                    "service",
                    "endpoint",
                    v,
                    "must be an http:// or https:// URL",
                ));
            }
            config.service.endpoint = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = non_empty(section, "archive") {
            config.service.archive = v.parse::<ArchiveKind>().map_err(|_| {
                invalid("service", "archive", v, "must be 'document' or 'repository'")
            })?;
        }
        if let Some(v) = non_empty(section, "timeout") {
            config.service.timeout = parse_timeout("service", v)?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(v);
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = non_empty(section, "directory") {
            config.download.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "timeout") {
            config.download.timeout = parse_timeout("download", v)?;
        }
    }

    // [host] section
    if let Some(section) = ini.section(Some("host")) {
        let host = &mut config.host;
        host.platform = non_empty(section, "platform").map(|v| v.to_lowercase());
        host.platform_version = non_empty(section, "platform_version").map(str::to_string);
        host.architecture = non_empty(section, "architecture").map(str::to_string);
        host.instance_id = non_empty(section, "instance_id").map(str::to_string);
        host.instance_type = non_empty(section, "instance_type").map(str::to_string);
        host.region = non_empty(section, "region").map(str::to_string);
        host.availability_zone = non_empty(section, "availability_zone").map(str::to_string);
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
    }

    Ok(config)
}

/// Trimmed value of `key`, or `None` when absent or blank.
fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timeout(section: &str, value: &str) -> Result<u64, ConfigFileError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(invalid(
            section,
            "timeout",
            value,
            "must be a positive integer (seconds)",
        )),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
