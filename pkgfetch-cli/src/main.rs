//! pkgfetch CLI - Command-line interface
//!
//! Downloads package manifests, resolves and downloads the artifact for this
//! host, and reports install results to the control plane.

mod commands;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pkgfetch::logging::{default_log_file, init_console_logging, init_logging, LoggingGuard};

use commands::common::load_config;
use commands::config::ConfigCommands;
use commands::package::{DownloadArgs, PackageArgs, ResolveArgs};
use commands::report::ReportArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "pkgfetch")]
#[command(version = pkgfetch::VERSION)]
#[command(about = "Resolve, download and report versioned packages", long_about = None)]
struct Cli {
    /// Config file (default: ~/.pkgfetch/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug output on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to the [logging] directory
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a package manifest and report whether it changed
    Manifest(PackageArgs),

    /// Download the package artifact for this host
    Download(DownloadArgs),

    /// Resolve a local manifest against this host
    Resolve(ResolveArgs),

    /// Report the result of an install, upgrade or uninstall
    Report(ReportArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        config: config_path,
        verbose,
        log,
        command,
    } = cli;

    if let Commands::Config(command) = command {
        init_console_logging(verbose);
        return commands::config::run(command, config_path.as_deref());
    }

    let config = load_config(config_path.as_deref())?;
    let _guard = setup_logging(log, verbose, &config.logging.directory)?;
    tracing::debug!(version = pkgfetch::VERSION, "pkgfetch starting");

    match command {
        Commands::Manifest(args) => commands::package::run_manifest(&config, args),
        Commands::Download(args) => commands::package::run_download(&config, args),
        Commands::Resolve(args) => commands::package::run_resolve(&config, args),
        Commands::Report(args) => commands::report::run(&config, args),
        Commands::Config(_) => Ok(()),
    }
}

/// Set up file logging when requested, console logging otherwise.
fn setup_logging(
    to_file: bool,
    verbose: bool,
    log_dir: &Path,
) -> Result<Option<LoggingGuard>, CliError> {
    if to_file {
        let guard = init_logging(log_dir, default_log_file())
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;
        Ok(Some(guard))
    } else {
        init_console_logging(verbose);
        Ok(None)
    }
}
