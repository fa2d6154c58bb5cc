//! Declarative YAML verification flows

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FlowError, FlowResult};
use crate::step::Step;

/// A complete verification flow parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Unique name for this flow
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering flows
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Flow {
    /// Parse a flow from a YAML string
    pub fn from_yaml(yaml: &str) -> FlowResult<Self> {
        let flow: Flow = serde_yaml::from_str(yaml)?;
        flow.validate()?;
        Ok(flow)
    }

    /// Parse a flow from a YAML file
    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            FlowError::FlowFile(reason) => {
                FlowError::FlowFile(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Load all flows from a directory, sorted by file path so suite
    /// order is stable across runs
    pub fn load_all(dir: &Path) -> FlowResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut flows = Vec::new();
        for path in paths {
            tracing::debug!(path = %path.display(), "loading flow");
            flows.push(Self::from_file(&path)?);
        }
        Ok(flows)
    }

    /// Filter flows by tag
    pub fn filter_by_tag<'a>(flows: &'a [Self], tag: &str) -> Vec<&'a Self> {
        flows.iter().filter(|f| f.tags.contains(&tag.to_string())).collect()
    }

    /// Structural checks beyond what serde enforces. An empty step list is
    /// allowed; such a flow trivially passes.
    pub fn validate(&self) -> FlowResult<()> {
        if self.name.trim().is_empty() {
            return Err(FlowError::FlowFile("flow name must not be empty".to_string()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(FlowError::FlowFile(format!(
                "flow '{}' has a zero-sized viewport",
                self.name
            )));
        }
        for (idx, step) in self.steps.iter().enumerate() {
            self.validate_step(idx, step)?;
        }
        Ok(())
    }

    fn validate_step(&self, idx: usize, step: &Step) -> FlowResult<()> {
        let fail = |reason: String| {
            Err(FlowError::FlowFile(format!(
                "flow '{}' step {}: {}",
                self.name,
                idx + 1,
                reason
            )))
        };
        match step {
            Step::Navigate { path } => {
                if path.trim().is_empty() {
                    return fail("navigate path must not be empty".to_string());
                }
            }
            Step::Fill { locator, .. } | Step::Click { locator } => {
                if let Err(e) = locator.validate() {
                    return fail(e.to_string());
                }
            }
            Step::ExpectVisible { locator, timeout_ms } => {
                if let Err(e) = locator.validate() {
                    return fail(e.to_string());
                }
                if *timeout_ms == 0 {
                    return fail("timeout_ms must be greater than zero".to_string());
                }
            }
            Step::ExpectUrl { timeout_ms, .. } => {
                if *timeout_ms == 0 {
                    return fail("timeout_ms must be greater than zero".to_string());
                }
            }
            Step::Screenshot { path } => {
                if path.as_os_str().is_empty() {
                    return fail("screenshot path must not be empty".to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    #[test]
    fn test_parse_simple_flow() {
        let yaml = r#"
name: login-check
description: Log in and land on the conversation list
tags:
  - auth
  - smoke
steps:
  - action: navigate
    path: /login
  - action: fill
    locator:
      id: username
    value: user1
  - action: fill
    locator:
      label: Password
    value: password1
  - action: click
    locator:
      role: button
      name: Login
  - action: expect_visible
    locator:
      role: heading
      name: Conversations
"#;
        let flow = Flow::from_yaml(yaml).unwrap();
        assert_eq!(flow.name, "login-check");
        assert_eq!(flow.steps.len(), 5);
        assert_eq!(flow.tags, vec!["auth", "smoke"]);
        assert_eq!(flow.viewport.width, 1280);
        assert_eq!(flow.viewport.height, 720);
        assert_eq!(
            flow.steps[3],
            Step::Click {
                locator: Locator::role_named("button", "Login")
            }
        );
    }

    #[test]
    fn test_parse_flow_with_viewport_and_screenshot() {
        let yaml = r#"
name: landing-visual
viewport:
  width: 1920
  height: 1080
steps:
  - action: navigate
    path: /
  - action: expect_url
    pattern: /
  - action: screenshot
    path: landing.png
"#;
        let flow = Flow::from_yaml(yaml).unwrap();
        assert_eq!(flow.viewport.width, 1920);
        assert_eq!(flow.viewport.height, 1080);
        match &flow.steps[2] {
            Step::Screenshot { path } => assert_eq!(path.to_str(), Some("landing.png")),
            other => panic!("expected Screenshot, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_steps_is_valid() {
        let flow = Flow::from_yaml("{ name: noop, steps: [] }").unwrap();
        assert!(flow.steps.is_empty());
    }

    #[test]
    fn test_missing_name_rejected() {
        let result = Flow::from_yaml("{ steps: [] }");
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_locator_reported_with_step_index() {
        let yaml = r#"
name: broken
steps:
  - action: navigate
    path: /
  - action: click
    locator:
      text: "["
"#;
        let err = Flow::from_yaml(yaml).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("step 2"), "unexpected message: {message}");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let yaml = r#"
name: broken
steps:
  - action: expect_url
    pattern: /login
    timeout_ms: 0
"#;
        assert!(Flow::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_filter_by_tag() {
        let a = Flow::from_yaml("{ name: a, tags: [smoke], steps: [] }").unwrap();
        let b = Flow::from_yaml("{ name: b, tags: [auth], steps: [] }").unwrap();
        let flows = vec![a, b];
        let smoke = Flow::filter_by_tag(&flows, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "a");
    }

    #[test]
    fn test_load_all_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-second.yaml"), "{ name: second, steps: [] }").unwrap();
        std::fs::write(dir.path().join("a-first.yaml"), "{ name: first, steps: [] }").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let flows = Flow::load_all(dir.path()).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].name, "first");
        assert_eq!(flows[1].name, "second");
    }
}
