//! Common types and utilities shared across CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use pkgfetch::config::{config_file_path, ArchiveKind, ConfigFile};
use pkgfetch::manager::{ManagerConfig, PackageService, TraceEntry, Tracer};

use crate::error::CliError;

/// Archive backend selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ArchiveType {
    /// Document archive (manifest stored as a document with attachments)
    Document,
    /// Package repository archive (download locations in the manifest)
    Repository,
}

impl From<ArchiveType> for ArchiveKind {
    fn from(value: ArchiveType) -> Self {
        match value {
            ArchiveType::Document => ArchiveKind::Document,
            ArchiveType::Repository => ArchiveKind::Repository,
        }
    }
}

/// Options overriding the service section of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct ServiceArgs {
    /// Control plane endpoint (overrides [service] endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Archive backend (overrides [service] archive)
    #[arg(long, value_enum)]
    pub archive: Option<ArchiveType>,

    /// Manifest JSON already in hand (repository archive only)
    #[arg(long, value_name = "FILE")]
    pub manifest_file: Option<PathBuf>,
}

/// Load the config file, from `path` when given.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    Ok(ConfigFile::load_from(&path)?)
}

/// Read a whole file as text.
pub fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })
}

/// Apply command-line overrides on top of the config file.
pub fn manager_config(config: &ConfigFile, args: &ServiceArgs) -> Result<ManagerConfig, CliError> {
    let mut manager = ManagerConfig::from_config_file(config);

    if let Some(endpoint) = &args.endpoint {
        manager = manager.with_endpoint(endpoint.trim_end_matches('/'));
    }
    if let Some(archive) = args.archive {
        manager = manager.with_archive(archive.into());
    }
    if let Some(path) = &args.manifest_file {
        if manager.archive != ArchiveKind::Repository {
            return Err(CliError::Config(
                "--manifest-file requires the repository archive. \
                 Set archive = repository in config.ini or use --archive repository"
                    .to_string(),
            ));
        }
        manager = manager.with_repository_manifest(read_file(path)?);
    }

    Ok(manager)
}

/// Build the package service for a command.
pub fn build_service(config: &ConfigFile, args: &ServiceArgs) -> Result<PackageService, CliError> {
    let manager = manager_config(config, args)?;
    Ok(PackageService::from_config(&manager)?)
}

/// Print the trace sections recorded during a command.
pub fn print_trace(tracer: &Tracer) {
    for entry in tracer.entries() {
        println!("{}", format_trace_entry(&entry));
    }
}

fn format_trace_entry(entry: &TraceEntry) -> String {
    let status = if entry.error.is_some() { "FAILED" } else { "ok" };
    let elapsed_ms = (entry.end_nanos - entry.start_nanos) / 1_000_000;
    let mut line = format!("  [{}] {} ({} ms)", status, entry.operation, elapsed_ms);
    for message in &entry.info {
        line.push_str(&format!("\n      {}", message));
    }
    if let Some(error) = &entry.error {
        line.push_str(&format!("\n      error: {}", error));
    }
    line
}
