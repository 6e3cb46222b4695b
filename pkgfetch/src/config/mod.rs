//! User configuration loaded from `~/.pkgfetch/config.ini`.
//!
//! Settings structs live in [`settings`], parsing in `parser` and
//! serialization in `writer`. [`ConfigFile`] ties them together.
//!
//! # Example
//!
//! ```no_run
//! use pkgfetch::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("archive: {}", config.service.archive);
//! # Ok::<(), pkgfetch::config::ConfigFileError>(())
//! ```

mod file;
mod parser;
pub mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::*;
