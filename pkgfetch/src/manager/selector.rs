//! Platform, version and architecture selection.
//!
//! Resolution walks the three levels of the selector tree top-down. Each level
//! tries the host's exact value, then the [`ANY_SELECTOR`] wildcard, and
//! commits to whichever key it found before descending. A failure at a deeper
//! level never causes a different key to be tried at a shallower one.

use std::collections::HashMap;
use std::fmt;

use super::error::{ManagerError, ManagerResult};
use super::manifest::{
    ArchitectureSelectors, Manifest, PackageVariant, SelectorTree, VersionSelectors, ANY_SELECTOR,
};

/// Level of the selector tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorLevel {
    Platform,
    PlatformVersion,
    Architecture,
}

impl fmt::Display for SelectorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => write!(f, "platform"),
            Self::PlatformVersion => write!(f, "platform version"),
            Self::Architecture => write!(f, "architecture"),
        }
    }
}

/// Exact key if present, else the wildcard key if present.
fn match_key<'a, V>(key: &'a str, selectors: &HashMap<String, V>) -> Option<&'a str> {
    if selectors.contains_key(key) {
        Some(key)
    } else if selectors.contains_key(ANY_SELECTOR) {
        Some(ANY_SELECTOR)
    } else {
        None
    }
}

/// Select the platform key for `platform`.
pub fn match_platform<'a>(platform: &'a str, packages: &SelectorTree) -> Option<&'a str> {
    match_key(platform, packages)
}

/// Select the platform version key for `version`.
pub fn match_platform_version<'a>(
    version: &'a str,
    versions: &VersionSelectors,
) -> Option<&'a str> {
    match_key(version, versions)
}

/// Select the architecture key for `architecture`.
pub fn match_architecture<'a>(
    architecture: &'a str,
    architectures: &ArchitectureSelectors,
) -> Option<&'a str> {
    match_key(architecture, architectures)
}

/// Find the package variant for a host.
///
/// # Errors
///
/// Returns [`ManagerError::NoMatch`] naming the host triple and the first
/// level with neither an exact nor a wildcard entry.
pub fn resolve_variant<'m>(
    manifest: &'m Manifest,
    platform: &str,
    platform_version: &str,
    architecture: &str,
) -> ManagerResult<&'m PackageVariant> {
    let no_match = |level| ManagerError::NoMatch {
        platform: platform.to_string(),
        platform_version: platform_version.to_string(),
        architecture: architecture.to_string(),
        level,
    };

    let platform_key = match_platform(platform, &manifest.packages)
        .ok_or_else(|| no_match(SelectorLevel::Platform))?;
    let versions = &manifest.packages[platform_key];

    let version_key = match_platform_version(platform_version, versions)
        .ok_or_else(|| no_match(SelectorLevel::PlatformVersion))?;
    let architectures = &versions[version_key];

    let arch_key = match_architecture(architecture, architectures)
        .ok_or_else(|| no_match(SelectorLevel::Architecture))?;

    tracing::debug!(
        platform = platform_key,
        platform_version = version_key,
        architecture = arch_key,
        "Selected package variant"
    );

    Ok(&architectures[arch_key])
}
