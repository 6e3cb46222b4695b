//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use pkgfetch::config::ConfigFileError;
use pkgfetch::manager::ManagerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Package service operation failed
    Service(ManagerError),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// Failed to write an output file
    FileWrite { path: String, error: std::io::Error },
    /// Input file has invalid content
    InvalidInput { path: String, reason: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Service(ManagerError::InvalidConfig(_)) | CliError::Config(_) => {
                eprintln!();
                eprintln!("Create a config file with: pkgfetch config init");
                eprintln!("then set [service] endpoint, or pass --endpoint.");
            }
            CliError::Service(ManagerError::NoMatch { .. }) => {
                eprintln!();
                eprintln!("The manifest has no package for this host.");
                eprintln!("Check the detected values with: pkgfetch resolve --manifest <file>");
                eprintln!("Override wrong values in the [host] section of config.ini.");
            }
            CliError::Service(ManagerError::Timeout { .. }) => {
                eprintln!();
                eprintln!("Raise [service] timeout or [download] timeout in config.ini.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::InvalidInput { path, reason } => {
                write!(f, "Invalid content in '{}': {}", path, reason)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::FileRead { error, .. } | CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Service(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_service_error_displays_inner_message() {
        let err: CliError = ManagerError::ReportSubmission {
            reason: "HTTP 500".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "failed to report results: HTTP 500");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_file_read_display() {
        let err = CliError::FileRead {
            path: "result.json".to_string(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Failed to read file 'result.json': missing");
    }

    #[test]
    fn test_config_error_has_no_source() {
        assert!(CliError::Config("x".to_string()).source().is_none());
    }
}
