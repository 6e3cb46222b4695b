//! Result reporting command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pkgfetch::config::ConfigFile;
use pkgfetch::manager::{
    ManagerConfig, ManagerError, ManagerResult, PackageResult, ReportTransport, ResultReport,
    ResultReporter, SystemClock, SystemCollector, Tracer,
};

use super::common::{build_service, print_trace, read_file, ServiceArgs};
use crate::error::CliError;

/// Arguments for reporting an operation result.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Package result JSON file
    #[arg(long, value_name = "FILE")]
    pub result: PathBuf,

    /// Print the report instead of submitting it
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub service: ServiceArgs,

    /// Print the recorded trace sections
    #[arg(long)]
    pub trace: bool,
}

/// Transport writing reports to stdout as JSON.
struct StdoutTransport;

impl ReportTransport for StdoutTransport {
    fn submit(&self, report: &ResultReport) -> ManagerResult<()> {
        let json = serde_json::to_string_pretty(report).map_err(|e| ManagerError::Decode {
            reason: e.to_string(),
        })?;
        println!("{}", json);
        Ok(())
    }
}

/// Load a package result from a JSON file.
pub fn load_result(path: &std::path::Path) -> Result<PackageResult, CliError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| CliError::InvalidInput {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Submit (or print) the report for a package result.
pub fn run(config: &ConfigFile, args: ReportArgs) -> Result<(), CliError> {
    let result = load_result(&args.result)?;
    let tracer = Tracer::default();

    let outcome = if args.dry_run {
        let overrides = ManagerConfig::from_config_file(config).host_overrides;
        let reporter = ResultReporter::new(
            Arc::new(SystemCollector::new().with_overrides(overrides)),
            Arc::new(StdoutTransport),
            Arc::new(SystemClock),
        );
        reporter.report_result(&tracer, &result)
    } else {
        let service = build_service(config, &args.service)?;
        service.report_result(&tracer, &result)
    };

    if args.trace {
        print_trace(&tracer);
    }
    outcome?;

    if !args.dry_run {
        println!(
            "Reported {} {} for {} {}",
            result.operation,
            if result.exit_code == 0 { "success" } else { "failure" },
            result.package_name,
            result.version
        );
    }
    Ok(())
}
