//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`common`] - Config loading and service construction
//! - [`config`] - Configuration management (init, path, show)
//! - [`package`] - Manifest download, artifact download, offline resolution
//! - [`report`] - Result reporting

pub mod common;
pub mod config;
pub mod package;
pub mod report;
