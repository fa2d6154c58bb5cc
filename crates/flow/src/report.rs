//! Run reports
//!
//! A [`FlowReport`] is what a successful session run produces; the suite
//! layer folds successes and failures into [`FlowOutcome`] rows and an
//! aggregate [`SuiteReport`] that serializes to `results.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, FlowError, FlowResult};

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based position within the flow
    pub index: usize,
    /// Rendered step label, with fill values redacted
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl StepReport {
    pub fn passed(index: usize, step: String, duration_ms: u64) -> Self {
        Self { index, step, success: true, duration_ms, error: None }
    }

    pub fn failed(index: usize, step: String, duration_ms: u64, error: &FlowError) -> Self {
        Self {
            index,
            step,
            success: false,
            duration_ms,
            error: Some(error.to_string()),
        }
    }
}

/// A file captured during a run, content-addressed for later comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// File stem, used as the baseline key
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

/// Everything a flow produced when it ran to completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReport {
    pub flow: String,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    pub artifacts: Vec<ArtifactRecord>,
    /// Page URL when the last step finished
    pub final_url: Option<String>,
}

/// Per-flow row in the suite report, covering both passes and failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowOutcome {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub steps: Vec<StepReport>,
    pub artifacts: Vec<ArtifactRecord>,
}

impl FlowOutcome {
    pub fn from_report(report: FlowReport) -> Self {
        Self {
            name: report.flow,
            passed: true,
            duration_ms: report.duration_ms,
            error: None,
            error_kind: None,
            steps: report.steps,
            artifacts: report.artifacts,
        }
    }

    pub fn from_error(name: &str, duration_ms: u64, error: &FlowError) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            duration_ms,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            steps: Vec::new(),
            artifacts: Vec::new(),
        }
    }
}

/// Result of running a whole suite of flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<FlowOutcome>,
}

impl SuiteReport {
    pub fn new(started_at: DateTime<Utc>, duration_ms: u64, outcomes: Vec<FlowOutcome>) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            duration_ms,
            started_at,
            outcomes,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Write the report to `results.json` under `dir`
    pub fn write(&self, dir: &Path) -> FlowResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> FlowReport {
        FlowReport {
            flow: "login-check".to_string(),
            duration_ms: 1200,
            steps: vec![
                StepReport::passed(1, "navigate /login".to_string(), 300),
                StepReport::passed(2, "click role button \"Login\"".to_string(), 40),
            ],
            artifacts: vec![ArtifactRecord {
                name: "verification".to_string(),
                path: PathBuf::from("artifacts/verification.png"),
                sha256: "ab".repeat(32),
                bytes: 1024,
            }],
            final_url: Some("http://localhost:5173/".to_string()),
        }
    }

    #[test]
    fn test_outcome_from_report_is_passed() {
        let outcome = FlowOutcome::from_report(sample_report());
        assert!(outcome.passed);
        assert_eq!(outcome.name, "login-check");
        assert_eq!(outcome.steps.len(), 2);
        assert!(outcome.error.is_none());
        assert!(outcome.error_kind.is_none());
    }

    #[test]
    fn test_outcome_from_error_carries_kind() {
        let err = FlowError::AssertionTimeout {
            condition: "visible: role heading \"Conversations\"".to_string(),
            elapsed_ms: 10_000,
            timeout_ms: 10_000,
        };
        let outcome = FlowOutcome::from_error("login-check", 10_100, &err);
        assert!(!outcome.passed);
        assert_eq!(outcome.error_kind, Some(ErrorKind::AssertionTimeout));
        assert!(outcome.error.as_deref().unwrap().contains("10000ms"));
    }

    #[test]
    fn test_suite_counts() {
        let ok = FlowOutcome::from_report(sample_report());
        let err = FlowError::Navigation {
            url: "http://localhost:5173/".to_string(),
            reason: "connection refused".to_string(),
        };
        let bad = FlowOutcome::from_error("app-loads", 30, &err);
        let suite = SuiteReport::new(Utc::now(), 1230, vec![ok, bad]);
        assert_eq!(suite.total, 2);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.failed, 1);
        assert!(!suite.is_success());
    }

    #[test]
    fn test_suite_report_roundtrips_through_json() {
        let suite = SuiteReport::new(
            Utc::now(),
            1200,
            vec![FlowOutcome::from_report(sample_report())],
        );
        let json = serde_json::to_string(&suite).unwrap();
        assert!(json.contains("\"login-check\""));
        let back: SuiteReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, 1);
        assert!(back.is_success());
    }

    #[test]
    fn test_write_creates_results_json() {
        let dir = tempfile::tempdir().unwrap();
        let suite = SuiteReport::new(Utc::now(), 0, Vec::new());
        let path = suite.write(dir.path()).unwrap();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("results.json"));
        assert!(path.exists());
    }
}
