//! pkgfetch - package manifest resolution and artifact acquisition
//!
//! This library decides which variant of a versioned software package a host
//! should install, downloads it, and reports the outcome to a control plane.
//!
//! # High-Level API
//!
//! The [`manager::PackageService`] facade covers the whole flow:
//!
//! ```no_run
//! use pkgfetch::config::ConfigFile;
//! use pkgfetch::manager::{ManagerConfig, PackageService, Tracer};
//!
//! let file = ConfigFile::load()?;
//! let service = PackageService::from_config(&ManagerConfig::from_config_file(&file))?;
//!
//! let tracer = Tracer::default();
//! let path = service.download_artifact(&tracer, "AmazonCloudWatchAgent", "latest")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod config;
pub mod logging;
pub mod manager;

/// Version of the pkgfetch library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
