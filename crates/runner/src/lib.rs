//! Webproof browser session runner
//!
//! This crate drives a headless Chromium over the DevTools protocol to
//! execute declarative verification flows against a running web app:
//! - Spawns the app under verification as a subprocess
//! - Opens one browser page per flow and executes its steps in order
//! - Resolves semantic locators (label, role, id, text) fresh on every use
//! - Captures content-addressed PNG artifacts and compares baselines
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     FlowRunner                              │
//! │    ├── start_app() -> AppHandle        (fixture.rs)         │
//! │    ├── ChromeDriver::launch()          (chrome.rs)          │
//! │    ├── Session::run(flow) -> FlowReport (session.rs)        │
//! │    └── SuiteReport -> results.json                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session<D: PageDriver>                                     │
//! │    ├── navigate { path }      goto, bounded by timeout      │
//! │    ├── fill / click           exactly-one-match, no waiting │
//! │    ├── expect_visible         poll until visible or budget  │
//! │    ├── expect_url             poll until URL matches        │
//! │    └── screenshot { path }    PNG artifact via ArtifactStore│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session owns all timing: drivers answer "what is on the page right
//! now" and never wait on their own.

pub mod artifact;
pub mod chrome;
pub mod dom;
pub mod driver;
pub mod fixture;
pub mod runner;
pub mod session;

pub use artifact::{ArtifactStore, BaselineComparer, BaselineDiff, BaselineOptions};
pub use chrome::{detect_chrome, BrowserOptions, ChromeDriver};
pub use driver::PageDriver;
pub use fixture::{AppConfig, AppHandle};
pub use runner::{FlowRunner, RunnerConfig};
pub use session::{Session, SessionOptions};
