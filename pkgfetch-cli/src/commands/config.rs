//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path` and `config show`.

use std::path::Path;

use clap::Subcommand;
use pkgfetch::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand against the file at `path` (or the default).
pub fn run(command: ConfigCommands, path: Option<&Path>) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    if ConfigFile::ensure_exists_at(path)? {
        println!("Created {}", path.display());
        println!("Set [service] endpoint before running remote commands.");
    } else {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }
    Ok(())
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    let unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(detected)".to_string());

    println!("Configuration ({})", path.display());
    println!("======================");
    println!();
    println!("[service]");
    println!(
        "  endpoint = {}",
        config.service.endpoint.as_deref().unwrap_or("(not set)")
    );
    println!("  archive = {}", config.service.archive);
    println!("  timeout = {}", config.service.timeout);
    println!();
    println!("[cache]");
    println!("  directory = {}", config.cache.directory.display());
    println!();
    println!("[download]");
    println!("  directory = {}", config.download.directory.display());
    println!("  timeout = {}", config.download.timeout);
    println!();
    println!("[host]");
    println!("  platform = {}", unset(&config.host.platform));
    println!("  platform_version = {}", unset(&config.host.platform_version));
    println!("  architecture = {}", unset(&config.host.architecture));
    println!("  instance_id = {}", unset(&config.host.instance_id));
    println!("  instance_type = {}", unset(&config.host.instance_type));
    println!("  region = {}", unset(&config.host.region));
    println!("  availability_zone = {}", unset(&config.host.availability_zone));
    println!();
    println!("[logging]");
    println!("  directory = {}", config.logging.directory.display());

    Ok(())
}
