//! URL expectations
//!
//! An `expect_url` step carries one pattern string, interpreted by shape:
//! a string with a scheme (`http://…`) must equal the page URL, a string
//! starting with `/` must equal the page URL's path component, and anything
//! else is a regular expression applied to the full page URL. Patterns are
//! validated when the flow is parsed, not when the step runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlowError;

/// A pattern the page URL is polled against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Exact,
    Path,
    Pattern(regex::Regex),
}

impl UrlPattern {
    /// Whether the given page URL satisfies this pattern
    pub fn matches(&self, url: &str) -> bool {
        match &self.kind {
            PatternKind::Exact => trim_trailing_slash(url) == trim_trailing_slash(&self.raw),
            PatternKind::Path => url_path(url) == trim_trailing_slash(&self.raw),
            PatternKind::Pattern(re) => re.is_match(url),
        }
    }

    /// The pattern as written in the flow
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Extract the path component of an absolute URL, without query or fragment.
/// A URL with no path maps to "/".
fn url_path(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => url,
    };
    let path = match rest.find('/') {
        Some(i) => &rest[i..],
        None => "/",
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    trim_trailing_slash(path)
}

fn trim_trailing_slash(s: &str) -> &str {
    if s.len() > 1 {
        s.trim_end_matches('/')
    } else {
        s
    }
}

impl FromStr for UrlPattern {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FlowError::FlowFile("url pattern is empty".to_string()));
        }
        let kind = if s.contains("://") {
            PatternKind::Exact
        } else if s.starts_with('/') {
            PatternKind::Path
        } else {
            let re = regex::Regex::new(s).map_err(|e| {
                FlowError::FlowFile(format!("invalid url pattern {s:?}: {e}"))
            })?;
            PatternKind::Pattern(re)
        };
        Ok(Self {
            raw: s.to_string(),
            kind,
        })
    }
}

impl TryFrom<String> for UrlPattern {
    type Error = FlowError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UrlPattern> for String {
    fn from(pattern: UrlPattern) -> String {
        pattern.raw
    }
}

impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for UrlPattern {}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
