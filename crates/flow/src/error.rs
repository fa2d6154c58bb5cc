//! Error types for verification flows

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FlowError
pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// Errors a verification flow can end with
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("locator {locator} matched {matched} element(s), expected exactly one")]
    Locator { locator: String, matched: usize },

    #[error("locator {locator} is not interactable: {reason}")]
    NotInteractable { locator: String, reason: String },

    #[error("assertion timed out after {elapsed_ms}ms (budget {timeout_ms}ms): {condition}")]
    AssertionTimeout {
        condition: String,
        elapsed_ms: u64,
        timeout_ms: u64,
    },

    #[error("artifact {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },

    #[error("artifact mismatch: {name} differs by {diff_percent:.2}% (threshold: {threshold:.2}%)")]
    ArtifactMismatch {
        name: String,
        diff_percent: f64,
        threshold: f64,
    },

    #[error("baseline not found: {0}")]
    BaselineMissing(String),

    #[error("browser failed to launch: {0}")]
    Launch(String),

    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("flow definition error: {0}")]
    FlowFile(String),

    #[error("app fixture error: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Coarse classification of a FlowError, carried in reports so callers can
/// branch on the failure class without matching display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Navigation,
    Locator,
    AssertionTimeout,
    Artifact,
    Launch,
    Driver,
    FlowFile,
    Fixture,
    Io,
}

impl FlowError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Navigation { .. } => ErrorKind::Navigation,
            FlowError::Locator { .. } | FlowError::NotInteractable { .. } => ErrorKind::Locator,
            FlowError::AssertionTimeout { .. } => ErrorKind::AssertionTimeout,
            FlowError::Artifact { .. }
            | FlowError::ArtifactMismatch { .. }
            | FlowError::BaselineMissing(_) => ErrorKind::Artifact,
            FlowError::Launch(_) => ErrorKind::Launch,
            FlowError::Driver(_) => ErrorKind::Driver,
            FlowError::FlowFile(_) | FlowError::Yaml(_) => ErrorKind::FlowFile,
            FlowError::Fixture(_) => ErrorKind::Fixture,
            FlowError::Io(_) | FlowError::Json(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = FlowError::Locator {
            locator: "label \"Email\"".to_string(),
            matched: 2,
        };
        assert_eq!(err.kind(), ErrorKind::Locator);

        let err = FlowError::NotInteractable {
            locator: "id \"banner\"".to_string(),
            reason: "element is not fillable".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Locator);

        let err = FlowError::AssertionTimeout {
            condition: "element visible".to_string(),
            elapsed_ms: 10_000,
            timeout_ms: 10_000,
        };
        assert_eq!(err.kind(), ErrorKind::AssertionTimeout);
    }

    #[test]
    fn test_display_carries_context() {
        let err = FlowError::Locator {
            locator: "label \"Email\"".to_string(),
            matched: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("label \"Email\""));
        assert!(msg.contains("2"));

        let err = FlowError::AssertionTimeout {
            condition: "url matches /login".to_string(),
            elapsed_ms: 10_050,
            timeout_ms: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("10050ms"));
        assert!(msg.contains("10000ms"));
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::AssertionTimeout).unwrap();
        assert_eq!(json, "\"assertion_timeout\"");
    }
}
