//! Package commands: manifest download, artifact download and offline
//! variant resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use pkgfetch::config::ConfigFile;
use pkgfetch::manager::{
    locate_file, parse_manifest, resolve_variant, EnvironmentCollector, ManagerConfig, NanoTime,
    PackageResult, SystemClock, SystemCollector, Tracer, EXIT_FAILURE, EXIT_SUCCESS,
    LATEST_VERSION,
};

use super::common::{build_service, print_trace, read_file, ServiceArgs};
use crate::error::CliError;

/// Arguments naming a package version on the control plane.
#[derive(Debug, Args)]
pub struct PackageArgs {
    /// Package name or ARN
    pub package: String,

    /// Package version
    #[arg(long, default_value = LATEST_VERSION)]
    pub version: String,

    #[command(flatten)]
    pub service: ServiceArgs,

    /// Print the recorded trace sections
    #[arg(long)]
    pub trace: bool,
}

/// Arguments for downloading the artifact for this host.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Write the outcome as a package result JSON file for `pkgfetch report`
    #[arg(long, value_name = "FILE")]
    pub result_out: Option<PathBuf>,
}

/// Arguments for resolving a local manifest against this host.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Manifest JSON file
    #[arg(long, value_name = "FILE")]
    pub manifest: PathBuf,

    /// Platform name (overrides detection and [host] platform)
    #[arg(long)]
    pub platform: Option<String>,

    /// Platform version (overrides detection and [host] platform_version)
    #[arg(long)]
    pub platform_version: Option<String>,

    /// Architecture (overrides detection and [host] architecture)
    #[arg(long)]
    pub arch: Option<String>,
}

/// Download a manifest and report whether it changed.
pub fn run_manifest(config: &ConfigFile, args: PackageArgs) -> Result<(), CliError> {
    let service = build_service(config, &args.service)?;
    let tracer = Tracer::default();

    let result = service.download_manifest(&tracer, &args.package, &args.version);
    if args.trace {
        print_trace(&tracer);
    }
    let summary = result?;

    println!("Archive:   {}", service.name());
    println!("Resource:  {}", summary.resource_arn);
    println!("Version:   {}", summary.version);
    println!(
        "Status:    {}",
        if summary.unchanged_from_cache {
            "unchanged from cache"
        } else {
            "new or changed"
        }
    );

    Ok(())
}

/// Download the artifact for this host.
pub fn run_download(config: &ConfigFile, args: DownloadArgs) -> Result<(), CliError> {
    let DownloadArgs {
        package: args,
        result_out,
    } = args;
    let service = build_service(config, &args.service)?;
    let clock = Arc::new(SystemClock);
    let tracer = Tracer::new(clock.clone());
    let start_timestamp_nanos = clock.now_unix_nanos();

    let (name, version) = service.package_arn_and_version(&args.package, &args.version);
    tracing::debug!(package = %name, version = %version, "Canonical package identity");

    let result = service.download_artifact(&tracer, &args.package, &args.version);
    if args.trace {
        print_trace(&tracer);
    }

    if let Some(path) = result_out {
        let outcome = download_result(
            &args.package,
            &args.version,
            start_timestamp_nanos,
            &tracer,
            result.is_ok(),
        );
        write_result(&path, &outcome)?;
    }

    let path = result?;
    println!("{}", path.display());
    Ok(())
}

/// Package result of a download, with one step per trace section.
pub fn download_result(
    package_name: &str,
    version: &str,
    start_timestamp_nanos: i64,
    tracer: &Tracer,
    succeeded: bool,
) -> PackageResult {
    PackageResult {
        package_name: package_name.to_string(),
        version: version.to_string(),
        previous_version: String::new(),
        operation: "Download".to_string(),
        exit_code: if succeeded { EXIT_SUCCESS } else { EXIT_FAILURE },
        start_timestamp_nanos,
        steps: tracer.steps(),
    }
}

fn write_result(path: &Path, result: &PackageResult) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(result).map_err(|e| CliError::InvalidInput {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::write(path, json).map_err(|error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    })
}

/// Resolve a local manifest against this host without any network access.
pub fn run_resolve(config: &ConfigFile, args: ResolveArgs) -> Result<(), CliError> {
    let content = read_file(&args.manifest)?;
    let manifest = parse_manifest(content.as_bytes()).map_err(|e| CliError::InvalidInput {
        path: args.manifest.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut overrides = ManagerConfig::from_config_file(config).host_overrides;
    let os = &mut overrides.operating_system;
    if let Some(platform) = args.platform {
        os.platform = platform.to_lowercase();
    }
    if let Some(version) = args.platform_version {
        os.platform_version = version;
    }
    if let Some(arch) = args.arch {
        os.architecture = arch;
    }

    let environment = SystemCollector::new().with_overrides(overrides).collect()?;
    let host = &environment.operating_system;

    println!("Platform:          {}", host.platform);
    println!("Platform version:  {}", host.platform_version);
    println!("Architecture:      {}", host.architecture);

    let variant = resolve_variant(
        &manifest,
        &host.platform,
        &host.platform_version,
        &host.architecture,
    )?;
    let file = locate_file(&manifest, variant)?;

    println!("File:              {}", file.name);
    let mut checksums: Vec<_> = file.info.checksums.iter().collect();
    checksums.sort();
    for (algorithm, digest) in checksums {
        println!("  {:<8} {}", algorithm, digest);
    }
    if let Some(location) = &file.info.download_location {
        println!("Location:          {}", location);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::report::load_result;
    use pkgfetch::manager::ManagerError;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "version": "1.0.0",
        "packages": { "linux": { "_any": { "x86_64": { "file": "pkg.zip" } } } },
        "files": { "pkg.zip": { "checksums": { "sha256": "abc" } } }
    }"#;

    fn resolve_args(dir: &TempDir, content: &str, platform: &str) -> ResolveArgs {
        let path = dir.path().join("manifest.json");
        fs::write(&path, content).unwrap();
        ResolveArgs {
            manifest: path,
            platform: Some(platform.to_string()),
            platform_version: Some("22.04".to_string()),
            arch: Some("x86_64".to_string()),
        }
    }

    #[test]
    fn test_resolve_matches_wildcard_version() {
        let temp = TempDir::new().unwrap();
        let args = resolve_args(&temp, MANIFEST, "Linux");
        assert!(run_resolve(&ConfigFile::default(), args).is_ok());
    }

    #[test]
    fn test_resolve_reports_no_match() {
        let temp = TempDir::new().unwrap();
        let args = resolve_args(&temp, MANIFEST, "windows");
        let result = run_resolve(&ConfigFile::default(), args);
        assert!(matches!(
            result,
            Err(CliError::Service(ManagerError::NoMatch { .. }))
        ));
    }

    #[test]
    fn test_resolve_rejects_malformed_manifest() {
        let temp = TempDir::new().unwrap();
        let args = resolve_args(&temp, "not json", "linux");
        let result = run_resolve(&ConfigFile::default(), args);
        assert!(matches!(result, Err(CliError::InvalidInput { .. })));
    }

    #[test]
    fn test_download_result_carries_trace_steps() {
        let tracer = Tracer::default();
        tracer.begin_section("download manifest").end();
        tracer
            .begin_section("download pkg.zip")
            .with_error(&"connection reset");

        let result = download_result("Tool", "latest", 7, &tracer, false);

        assert_eq!(result.operation, "Download");
        assert_eq!(result.exit_code, EXIT_FAILURE);
        assert_eq!(result.start_timestamp_nanos, 7);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].operation, "download manifest");
        assert_eq!(result.steps[0].exit_code, EXIT_SUCCESS);
        assert_eq!(result.steps[1].exit_code, EXIT_FAILURE);
    }

    #[test]
    fn test_written_result_loads_for_report() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("result.json");
        let tracer = Tracer::default();
        tracer.begin_section("download artifact").end();

        let result = download_result("Tool", "1.2.0", 1_000, &tracer, true);
        write_result(&path, &result).unwrap();

        assert_eq!(load_result(&path).unwrap(), result);
    }

    #[test]
    fn test_resolve_missing_file() {
        let args = ResolveArgs {
            manifest: PathBuf::from("/nonexistent/manifest.json"),
            platform: None,
            platform_version: None,
            arch: None,
        };
        let result = run_resolve(&ConfigFile::default(), args);
        assert!(matches!(result, Err(CliError::FileRead { .. })));
    }
}
