//! Logging setup.
//!
//! Diagnostics go through `tracing`. Two subscribers are provided:
//! - [`init_logging`] writes to a log file (cleared on start) and to stderr
//! - [`init_console_logging`] writes to stderr only
//!
//! Both honour `RUST_LOG` and default to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize file and stderr logging.
///
/// Creates `log_dir` if needed and truncates `log_file` before logging to it.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// cleared.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Initialize stderr-only logging. `verbose` lowers the default level to
/// `debug`.
pub fn init_console_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(env_filter(default))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "pkgfetch.log"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_file() {
        assert_eq!(default_log_file(), "pkgfetch.log");
    }

    #[test]
    fn test_env_filter_falls_back_to_default() {
        // RUST_LOG may be set in the environment; both paths must produce a filter.
        let filter = env_filter("debug");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // Installing a subscriber is process-global, so init_logging itself is
    // exercised by the CLI rather than here.
}
