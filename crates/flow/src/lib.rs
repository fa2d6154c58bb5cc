//! Webproof flow definitions
//!
//! Shared data model for the webproof verification runner: the declarative
//! steps a flow executes, the locators those steps target, URL expectations,
//! flow files, run reports, and the error taxonomy.

pub mod error;
pub mod flow;
pub mod locator;
pub mod report;
pub mod step;
pub mod url;

// Re-export commonly used types
pub use error::{ErrorKind, FlowError, FlowResult};
pub use flow::{Flow, Viewport};
pub use locator::Locator;
pub use report::{ArtifactRecord, FlowOutcome, FlowReport, StepReport, SuiteReport};
pub use step::Step;
pub use url::UrlPattern;

/// Webproof version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
