//! Flow orchestration - app fixture, browser sessions, suite reports

use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};

use webproof_flow::{Flow, FlowError, FlowOutcome, FlowResult, SuiteReport};

use crate::chrome::{BrowserOptions, ChromeDriver};
use crate::fixture::{AppConfig, AppHandle};
use crate::session::{Session, SessionOptions};

/// Runs verification flows end to end
pub struct FlowRunner {
    browser: BrowserOptions,
    session: SessionOptions,

    /// App to spawn before running (None = flows target an already-running app)
    app_config: Option<AppConfig>,

    /// Running app handle (if any)
    app: Option<AppHandle>,

    /// Flow files directory
    flows_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl FlowRunner {
    /// Create a runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            browser: config.browser,
            session: config.session,
            app_config: config.app,
            app: None,
            flows_dir: config.flows_dir,
            output_dir: config.output_dir,
        }
    }

    /// Start the app under verification, if one is configured
    pub async fn start_app(&mut self) -> FlowResult<()> {
        if self.app.is_some() {
            return Ok(()); // already running
        }
        let Some(config) = self.app_config.clone() else {
            return Ok(()); // flows target an external app
        };

        let app = AppHandle::spawn(config).await?;

        // sessions should hit the app we just spawned
        self.session.base_url = app.base_url().to_string();

        self.app = Some(app);
        Ok(())
    }

    /// Stop the app
    pub fn stop_app(&mut self) -> FlowResult<()> {
        if let Some(mut app) = self.app.take() {
            app.stop()?;
        }
        Ok(())
    }

    /// Run all flows in the flows directory
    pub async fn run_all(&mut self) -> FlowResult<SuiteReport> {
        let flows = Flow::load_all(&self.flows_dir)?;
        self.run_flows(&flows).await
    }

    /// Run flows matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> FlowResult<SuiteReport> {
        let flows = Flow::load_all(&self.flows_dir)?;
        let filtered: Vec<Flow> = Flow::filter_by_tag(&flows, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_flows(&filtered).await
    }

    /// Run specific flows by name, in the order given
    pub async fn run_named(&mut self, names: &[String]) -> FlowResult<SuiteReport> {
        let flows = Flow::load_all(&self.flows_dir)?;
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let flow = flows
                .iter()
                .find(|f| f.name == *name)
                .ok_or_else(|| FlowError::FlowFile(format!("flow not found: {name}")))?;
            selected.push(flow.clone());
        }
        self.run_flows(&selected).await
    }

    /// Run a list of flows
    pub async fn run_flows(&mut self, flows: &[Flow]) -> FlowResult<SuiteReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.start_app().await?;

        info!(
            "running {} flow(s) against {}",
            flows.len(),
            self.session.base_url
        );

        let mut outcomes = Vec::with_capacity(flows.len());
        for flow in flows {
            let outcome = self.run_flow(flow).await;
            if outcome.passed {
                info!("✓ {} ({} ms)", outcome.name, outcome.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    outcome.name,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            outcomes.push(outcome);
        }

        let report = SuiteReport::new(started_at, start.elapsed().as_millis() as u64, outcomes);

        info!("");
        info!(
            "Results: {} passed, {} failed ({} ms)",
            report.passed, report.failed, report.duration_ms
        );

        Ok(report)
    }

    /// Run a single flow in a fresh browser, never propagating its failure
    pub async fn run_flow(&mut self, flow: &Flow) -> FlowOutcome {
        let start = Instant::now();
        debug!("running flow: {}", flow.name);

        // flow viewport overrides the configured window size
        let mut browser = self.browser.clone();
        browser.window_width = flow.viewport.width;
        browser.window_height = flow.viewport.height;

        let driver = match ChromeDriver::launch(&browser).await {
            Ok(driver) => driver,
            Err(e) => {
                return FlowOutcome::from_error(
                    &flow.name,
                    start.elapsed().as_millis() as u64,
                    &e,
                )
            }
        };

        let session = Session::new(driver, self.session.clone());
        match session.run(flow).await {
            Ok(report) => FlowOutcome::from_report(report),
            Err(e) => FlowOutcome::from_error(&flow.name, start.elapsed().as_millis() as u64, &e),
        }
    }

    /// Write the suite report to `results.json` in the output directory
    pub fn write_report(&self, report: &SuiteReport) -> FlowResult<PathBuf> {
        let path = report.write(&self.output_dir)?;
        info!("results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for FlowRunner {
    fn drop(&mut self) {
        let _ = self.stop_app();
    }
}

/// Configuration for the flow runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub browser: BrowserOptions,
    pub session: SessionOptions,
    pub app: Option<AppConfig>,
    pub flows_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            browser: BrowserOptions::default(),
            session: SessionOptions::default(),
            app: None,
            flows_dir: PathBuf::from("flows"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.flows_dir, PathBuf::from("flows"));
        assert_eq!(config.output_dir, PathBuf::from("test-results"));
        assert!(config.app.is_none());
    }

    #[tokio::test]
    async fn test_run_named_rejects_unknown_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = FlowRunner::with_config(RunnerConfig {
            flows_dir: dir.path().to_path_buf(),
            ..RunnerConfig::default()
        });

        let err = runner
            .run_named(&["does-not-exist".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("flow not found"));
    }
}
