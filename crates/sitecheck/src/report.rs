//! Per-check results and the aggregate report

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assertion::Observation;
use crate::error::{RunnerResult, TransportError};
use crate::spec::CheckSpec;

/// Outcome of executing one check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub spec: CheckSpec,
    pub passed: bool,
    /// Set when the run was cancelled before this check started
    #[serde(default)]
    pub skipped: bool,
    pub failures: Vec<String>,
    pub observed_status: Option<u16>,
    #[serde(default)]
    pub observed_headers: BTreeMap<String, String>,
    pub observed_latency_ms: Option<u64>,
    pub duration_ms: u64,
}

impl CheckResult {
    /// Result for a check whose response was evaluated
    pub fn evaluated(
        spec: &CheckSpec,
        observed: Observation,
        failures: Vec<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            spec: spec.clone(),
            passed: failures.is_empty(),
            skipped: false,
            failures,
            observed_status: Some(observed.status),
            observed_headers: observed.headers,
            observed_latency_ms: Some(observed.latency_ms),
            duration_ms,
        }
    }

    /// Result for a check whose fetch never produced a response
    pub fn transport_failure(spec: &CheckSpec, err: &TransportError, duration_ms: u64) -> Self {
        Self {
            spec: spec.clone(),
            passed: false,
            skipped: false,
            failures: vec![format!("transport error: {}", err)],
            observed_status: None,
            observed_headers: BTreeMap::new(),
            observed_latency_ms: None,
            duration_ms,
        }
    }

    /// Placeholder for a check that never started
    pub fn skipped(spec: &CheckSpec) -> Self {
        Self {
            spec: spec.clone(),
            passed: false,
            skipped: true,
            failures: vec!["skipped: run cancelled before this check started".to_string()],
            observed_status: None,
            observed_headers: BTreeMap::new(),
            observed_latency_ms: None,
            duration_ms: 0,
        }
    }

    pub fn name(&self) -> &str {
        self.spec.display_name()
    }
}

/// Summary counts over a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Result of running a list of checks. Results keep input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub started_at: DateTime<Utc>,
    pub cancelled: bool,
    pub summary: Summary,
    pub results: Vec<CheckResult>,
}

impl Report {
    pub(crate) fn new(
        started_at: DateTime<Utc>,
        results: Vec<CheckResult>,
        duration_ms: u64,
        cancelled: bool,
    ) -> Self {
        let skipped = results.iter().filter(|r| r.skipped).count();
        let passed = results.iter().filter(|r| r.passed).count();
        let summary = Summary {
            total: results.len(),
            passed,
            failed: results.len() - passed - skipped,
            skipped,
            duration_ms,
        };

        Self {
            started_at,
            cancelled,
            summary,
            results,
        }
    }

    /// Empty report for an empty check list
    pub fn empty() -> Self {
        Self::new(Utc::now(), Vec::new(), 0, false)
    }

    /// True when nothing failed and nothing was skipped
    pub fn passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed && !r.skipped)
    }

    /// Write the report as pretty JSON into `output_dir`
    pub fn write_json(&self, output_dir: &Path) -> RunnerResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("sitecheck-report.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path)
    }
}
