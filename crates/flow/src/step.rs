//! Verification steps
//!
//! Steps are immutable data, executed strictly in declaration order. The two
//! `expect_*` steps are the only ones that wait; everything else acts on the
//! page exactly once and fails immediately if it cannot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::locator::Locator;
use crate::url::UrlPattern;

/// A single step in a verification flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path relative to the base URL, or to an absolute URL
    Navigate { path: String },

    /// Fill a form control with a value
    Fill { locator: Locator, value: String },

    /// Click an element
    Click { locator: Locator },

    /// Wait until an element matching the locator is visible
    ExpectVisible {
        locator: Locator,
        #[serde(default = "default_assert_timeout")]
        timeout_ms: u64,
    },

    /// Wait until the page URL matches the pattern
    ExpectUrl {
        pattern: UrlPattern,
        #[serde(default = "default_assert_timeout")]
        timeout_ms: u64,
    },

    /// Capture the page as a PNG artifact
    Screenshot {
        #[serde(default = "default_screenshot_path")]
        path: PathBuf,
    },
}

fn default_assert_timeout() -> u64 {
    10_000
}

fn default_screenshot_path() -> PathBuf {
    PathBuf::from("verification.png")
}

impl fmt::Display for Step {
    // fill values stay out of logs and reports
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Navigate { path } => write!(f, "navigate {path}"),
            Step::Fill { locator, .. } => write!(f, "fill {locator}"),
            Step::Click { locator } => write!(f, "click {locator}"),
            Step::ExpectVisible {
                locator,
                timeout_ms,
            } => write!(f, "expect visible {locator} within {timeout_ms}ms"),
            Step::ExpectUrl {
                pattern,
                timeout_ms,
            } => write!(f, "expect url {pattern} within {timeout_ms}ms"),
            Step::Screenshot { path } => write!(f, "screenshot {}", path.display()),
        }
    }
}
