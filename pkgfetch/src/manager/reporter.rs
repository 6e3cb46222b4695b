//! Result report construction and submission.
//!
//! After an install, upgrade or uninstall the caller hands a [`PackageResult`]
//! to the [`ResultReporter`]. Timestamps are converted into milliseconds
//! elapsed since the operation started and the host attributes are attached
//! before the report goes to the [`ReportTransport`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::{elapsed_millis, NanoTime};
use super::environment::{EnvironmentCollector, HostEnvironment};
use super::error::{ManagerError, ManagerResult};
use super::trace::Tracer;
use super::traits::ReportTransport;

/// Outcome of one step of a package operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStep {
    pub operation: String,
    pub exit_code: i64,
    pub timestamp_nanos: i64,
}

/// Outcome of a package operation as recorded by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResult {
    pub package_name: String,
    pub version: String,
    /// Version installed before the operation; empty when there was none.
    #[serde(default)]
    pub previous_version: String,
    pub operation: String,
    pub exit_code: i64,
    pub start_timestamp_nanos: i64,
    #[serde(default)]
    pub steps: Vec<ResultStep>,
}

/// One step of a submitted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportStep {
    pub action: String,
    pub result: i64,
    /// Milliseconds since the operation started.
    pub timing: i64,
}

/// Payload accepted by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultReport {
    pub package_name: String,
    pub package_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_package_version: Option<String>,
    pub operation: String,
    /// Milliseconds from the operation start until the report was built.
    pub overall_timing: i64,
    pub result: i64,
    pub attributes: BTreeMap<String, String>,
    pub steps: Vec<ReportStep>,
}

/// Builds and submits result reports.
pub struct ResultReporter {
    collector: Arc<dyn EnvironmentCollector>,
    transport: Arc<dyn ReportTransport>,
    clock: Arc<dyn NanoTime>,
}

impl ResultReporter {
    pub fn new(
        collector: Arc<dyn EnvironmentCollector>,
        transport: Arc<dyn ReportTransport>,
        clock: Arc<dyn NanoTime>,
    ) -> Self {
        Self {
            collector,
            transport,
            clock,
        }
    }

    /// Build the report for `result` on a host described by `environment`.
    pub fn build_report(
        &self,
        result: &PackageResult,
        environment: &HostEnvironment,
    ) -> ResultReport {
        let start = result.start_timestamp_nanos;

        let previous_package_version = if result.previous_version.is_empty() {
            None
        } else {
            Some(result.previous_version.clone())
        };

        ResultReport {
            package_name: result.package_name.clone(),
            package_version: result.version.clone(),
            previous_package_version,
            operation: result.operation.clone(),
            overall_timing: elapsed_millis(self.clock.now_unix_nanos(), start),
            result: result.exit_code,
            attributes: environment.attributes(),
            steps: result
                .steps
                .iter()
                .map(|step| ReportStep {
                    action: step.operation.clone(),
                    result: step.exit_code,
                    timing: elapsed_millis(step.timestamp_nanos, start),
                })
                .collect(),
        }
    }

    /// Submit the report for `result`.
    ///
    /// Host data that cannot be collected is reported with empty values.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::ReportSubmission`] wrapping the transport
    /// error.
    pub fn report_result(&self, tracer: &Tracer, result: &PackageResult) -> ManagerResult<()> {
        let mut section = tracer.begin_section("report result");

        let environment = self.collector.collect().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Reporting without host data");
            section.info(format!("host data unavailable: {}", e));
            HostEnvironment::default()
        });

        let report = self.build_report(result, &environment);

        if let Err(e) = self.transport.submit(&report) {
            let err = ManagerError::ReportSubmission {
                reason: e.to_string(),
            };
            section.with_error(&err);
            return Err(err);
        }

        tracing::info!(
            package = %report.package_name,
            version = %report.package_version,
            operation = %report.operation,
            result = report.result,
            overall_ms = report.overall_timing,
            "Reported result"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::clock::tests::FixedClock;
    use crate::manager::environment::{InstanceInfo, OperatingSystem, StaticCollector};
    use crate::manager::mocks::{FailingCollector, RecordingTransport};

    fn environment() -> HostEnvironment {
        HostEnvironment {
            operating_system: OperatingSystem {
                platform: "amazon".to_string(),
                platform_version: "2023".to_string(),
                architecture: "x86_64".to_string(),
            },
            instance: InstanceInfo {
                instance_id: "i-0abc".to_string(),
                instance_type: "t3.micro".to_string(),
                region: "us-west-2".to_string(),
                availability_zone: "us-west-2b".to_string(),
            },
        }
    }

    fn result() -> PackageResult {
        PackageResult {
            package_name: "AmazonCloudWatchAgent".to_string(),
            version: "1.2.0".to_string(),
            previous_version: String::new(),
            operation: "Install".to_string(),
            exit_code: 0,
            start_timestamp_nanos: 1_000_000_000,
            steps: vec![ResultStep {
                operation: "download".to_string(),
                exit_code: 0,
                timestamp_nanos: 1_002_000_000,
            }],
        }
    }

    fn reporter(
        collector: Arc<dyn EnvironmentCollector>,
        transport: Arc<RecordingTransport>,
        now: i64,
    ) -> ResultReporter {
        ResultReporter::new(collector, transport, Arc::new(FixedClock::at(now)))
    }

    #[test]
    fn test_step_timing_in_millis() {
        let transport = Arc::new(RecordingTransport::new());
        let reporter = reporter(
            Arc::new(StaticCollector::new(environment())),
            transport.clone(),
            1_005_000_000,
        );

        let report = reporter.build_report(&result(), &environment());

        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].action, "download");
        assert_eq!(report.steps[0].timing, 2);
        assert_eq!(report.overall_timing, 5);
    }

    #[test]
    fn test_step_before_start_is_negative() {
        let transport = Arc::new(RecordingTransport::new());
        let reporter = reporter(Arc::new(StaticCollector::default()), transport, 0);
        let mut result = result();
        result.steps[0].timestamp_nanos = 997_000_000;

        let report = reporter.build_report(&result, &HostEnvironment::default());
        assert_eq!(report.steps[0].timing, -3);
    }

    #[test]
    fn test_previous_version_omitted_when_empty() {
        let transport = Arc::new(RecordingTransport::new());
        let reporter = reporter(Arc::new(StaticCollector::default()), transport, 0);

        let report = reporter.build_report(&result(), &HostEnvironment::default());
        assert!(report.previous_package_version.is_none());
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("PreviousPackageVersion"));

        let mut upgrade = result();
        upgrade.previous_version = "1.1.0".to_string();
        let report = reporter.build_report(&upgrade, &HostEnvironment::default());
        assert_eq!(report.previous_package_version.as_deref(), Some("1.1.0"));
    }

    #[test]
    fn test_report_submits_with_attributes() {
        let transport = Arc::new(RecordingTransport::new());
        let reporter = reporter(
            Arc::new(StaticCollector::new(environment())),
            transport.clone(),
            1_010_000_000,
        );

        reporter.report_result(&Tracer::default(), &result()).unwrap();

        let reports = transport.reports();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.package_name, "AmazonCloudWatchAgent");
        assert_eq!(report.package_version, "1.2.0");
        assert_eq!(report.operation, "Install");
        assert_eq!(report.result, 0);
        assert_eq!(report.overall_timing, 10);
        assert_eq!(report.attributes["platformName"], "amazon");
        assert_eq!(report.attributes["instanceID"], "i-0abc");
        assert_eq!(report.attributes["availabilityZone"], "us-west-2b");
    }

    #[test]
    fn test_collector_failure_is_not_fatal() {
        let transport = Arc::new(RecordingTransport::new());
        let reporter = reporter(Arc::new(FailingCollector), transport.clone(), 1_000_000_000);

        reporter.report_result(&Tracer::default(), &result()).unwrap();

        let reports = transport.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].attributes.values().all(|v| v.is_empty()));
    }

    #[test]
    fn test_transport_failure_is_report_submission() {
        let transport = Arc::new(RecordingTransport::failing());
        let reporter = reporter(Arc::new(StaticCollector::default()), transport, 0);
        let tracer = Tracer::default();

        let err = reporter.report_result(&tracer, &result()).unwrap_err();

        assert!(matches!(err, ManagerError::ReportSubmission { .. }));
        assert!(err.to_string().starts_with("failed to report results: "));
        assert!(err.to_string().contains("503"));
        assert_eq!(tracer.entries()[0].exit_code, 1);
    }

    #[test]
    fn test_package_result_loads_from_camel_case_json() {
        let json = r#"{
            "packageName": "pkg",
            "version": "2.0",
            "operation": "Upgrade",
            "exitCode": 1,
            "startTimestampNanos": 5,
            "steps": [{ "operation": "install", "exitCode": 1, "timestampNanos": 9 }]
        }"#;
        let result: PackageResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.package_name, "pkg");
        assert!(result.previous_version.is_empty());
        assert_eq!(result.steps[0].timestamp_nanos, 9);
    }
}
