//! Declarative element locators
//!
//! A locator describes how to find one UI element; it never holds a live
//! element handle. Resolution happens fresh each time a step runs, so a
//! re-rendered page cannot leave a flow holding a stale reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FlowError, FlowResult};

/// How a step finds the element it acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    /// Form control associated with a `<label>` whose text matches
    Label {
        #[serde(rename = "label")]
        text: String,
    },

    /// Element with a given ARIA role (explicit or implicit) and, optionally,
    /// an accessible name
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Element with a given id attribute
    Id { id: String },

    /// Element whose visible text matches a regular expression
    Text {
        #[serde(rename = "text")]
        pattern: String,
    },
}

impl Locator {
    /// Locate a form control by its label text
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label { text: text.into() }
    }

    /// Locate an element by ARIA role
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
        }
    }

    /// Locate an element by ARIA role and accessible name
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    /// Locate an element by id
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id { id: id.into() }
    }

    /// Locate an element by a text regular expression
    pub fn text(pattern: impl Into<String>) -> Self {
        Self::Text {
            pattern: pattern.into(),
        }
    }

    /// Check that the locator is well formed: non-empty target, a role name
    /// that can be embedded in a CSS attribute selector, and a text pattern
    /// that compiles as a regex.
    pub fn validate(&self) -> FlowResult<()> {
        match self {
            Locator::Label { text } => {
                if text.is_empty() {
                    return Err(FlowError::FlowFile("label locator is empty".to_string()));
                }
            }
            Locator::Role { role, name } => {
                if role.is_empty() {
                    return Err(FlowError::FlowFile("role locator is empty".to_string()));
                }
                if !role
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                {
                    return Err(FlowError::FlowFile(format!(
                        "invalid ARIA role: {role:?}"
                    )));
                }
                if name.as_deref() == Some("") {
                    return Err(FlowError::FlowFile(format!(
                        "role locator {role:?} has an empty name"
                    )));
                }
            }
            Locator::Id { id } => {
                if id.is_empty() {
                    return Err(FlowError::FlowFile("id locator is empty".to_string()));
                }
            }
            Locator::Text { pattern } => {
                regex::Regex::new(pattern).map_err(|e| {
                    FlowError::FlowFile(format!("invalid text pattern {pattern:?}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Label { text } => write!(f, "label {text:?}"),
            Locator::Role {
                role,
                name: Some(name),
            } => write!(f, "role {role} {name:?}"),
            Locator::Role { role, name: None } => write!(f, "role {role}"),
            Locator::Id { id } => write!(f, "id {id:?}"),
            Locator::Text { pattern } => write!(f, "text /{pattern}/"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_form() {
        let loc: Locator = serde_yaml::from_str("label: Email").unwrap();
        assert_eq!(loc, Locator::label("Email"));
    }

    #[test]
    fn test_role_with_name_form() {
        let loc: Locator = serde_yaml::from_str("{ role: button, name: Login }").unwrap();
        assert_eq!(loc, Locator::role_named("button", "Login"));
    }

    #[test]
    fn test_role_without_name_form() {
        let loc: Locator = serde_yaml::from_str("role: heading").unwrap();
        assert_eq!(loc, Locator::role("heading"));
    }

    #[test]
    fn test_id_form() {
        let loc: Locator = serde_yaml::from_str("id: username").unwrap();
        assert_eq!(loc, Locator::id("username"));
    }

    #[test]
    fn test_text_form() {
        let loc: Locator = serde_yaml::from_str("text: user2|user3").unwrap();
        assert_eq!(loc, Locator::text("user2|user3"));
    }

    #[test]
    fn test_display_names_the_target() {
        assert_eq!(Locator::label("Email").to_string(), "label \"Email\"");
        assert_eq!(
            Locator::role_named("button", "Login").to_string(),
            "role button \"Login\""
        );
        assert_eq!(Locator::role("heading").to_string(), "role heading");
        assert_eq!(Locator::id("username").to_string(), "id \"username\"");
        assert_eq!(Locator::text("user2|user3").to_string(), "text /user2|user3/");
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        assert!(Locator::text("user(").validate().is_err());
        assert!(Locator::text("user2|user3").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_hostile_role() {
        assert!(Locator::role("button\"]").validate().is_err());
        assert!(Locator::role("button").validate().is_ok());
        assert!(Locator::role_named("button", "").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_targets() {
        assert!(Locator::label("").validate().is_err());
        assert!(Locator::id("").validate().is_err());
    }
}
