//! Flow execution against a page driver
//!
//! One session runs one flow on one page, strictly in step order, stopping
//! at the first failure. The session owns all timing: navigation is bounded
//! by a fixed timeout, and the two `expect_*` steps poll the driver until
//! their budget runs out. Nothing else waits.

use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use webproof_flow::{
    ArtifactRecord, Flow, FlowError, FlowReport, FlowResult, Locator, Step, StepReport, UrlPattern,
};

use crate::artifact::ArtifactStore;
use crate::driver::PageDriver;

/// Options governing a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Base URL that relative navigation paths resolve against
    pub base_url: String,

    /// Directory screenshot artifacts land in
    pub artifact_dir: PathBuf,

    /// Interval between assertion polls
    pub poll_interval: Duration,

    /// Budget for a single navigation to settle
    pub navigation_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            artifact_dir: PathBuf::from("test-results/artifacts"),
            poll_interval: Duration::from_millis(100),
            navigation_timeout: Duration::from_secs(15),
        }
    }
}

/// Executes one flow over a [`PageDriver`]
pub struct Session<D: PageDriver> {
    driver: D,
    options: SessionOptions,
}

impl<D: PageDriver> Session<D> {
    pub fn new(driver: D, options: SessionOptions) -> Self {
        Self { driver, options }
    }

    /// Run the flow to completion or first failure.
    ///
    /// The driver is closed exactly once before this returns, on every exit
    /// path. A close failure is logged and does not mask the run outcome.
    pub async fn run(mut self, flow: &Flow) -> FlowResult<FlowReport> {
        let started = Instant::now();
        let result = self.drive(flow).await;

        if let Err(e) = self.driver.close().await {
            warn!(flow = %flow.name, "driver close failed: {e}");
        }

        let (steps, artifacts, final_url) = result?;
        Ok(FlowReport {
            flow: flow.name.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            steps,
            artifacts,
            final_url,
        })
    }

    async fn drive(
        &mut self,
        flow: &Flow,
    ) -> FlowResult<(Vec<StepReport>, Vec<ArtifactRecord>, Option<String>)> {
        let total = flow.steps.len();
        let mut steps = Vec::with_capacity(total);
        let mut artifacts = Vec::new();

        for (idx, step) in flow.steps.iter().enumerate() {
            let index = idx + 1;
            debug!(flow = %flow.name, step = %step, "step {index}/{total}");
            let step_start = Instant::now();

            match self.execute(step, &mut artifacts).await {
                Ok(()) => {
                    steps.push(StepReport::passed(
                        index,
                        step.to_string(),
                        step_start.elapsed().as_millis() as u64,
                    ));
                }
                Err(e) => {
                    error!(flow = %flow.name, step = %step, "step {index}/{total} failed: {e}");
                    return Err(e);
                }
            }
        }

        let final_url = match self.driver.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("could not read final url: {e}");
                None
            }
        };
        Ok((steps, artifacts, final_url))
    }

    async fn execute(&mut self, step: &Step, artifacts: &mut Vec<ArtifactRecord>) -> FlowResult<()> {
        match step {
            Step::Navigate { path } => self.navigate(path).await,
            Step::Fill { locator, value } => self.driver.fill(locator, value).await,
            Step::Click { locator } => self.driver.click(locator).await,
            Step::ExpectVisible {
                locator,
                timeout_ms,
            } => self.wait_visible(locator, *timeout_ms).await,
            Step::ExpectUrl {
                pattern,
                timeout_ms,
            } => self.wait_url(pattern, *timeout_ms).await,
            Step::Screenshot { path } => {
                let png = self.driver.screenshot().await?;
                let store = ArtifactStore::new(&self.options.artifact_dir)?;
                let record = store.write(path, &png)?;
                artifacts.push(record);
                Ok(())
            }
        }
    }

    async fn navigate(&mut self, path: &str) -> FlowResult<()> {
        let url = join_url(&self.options.base_url, path);
        match tokio::time::timeout(self.options.navigation_timeout, self.driver.goto(&url)).await {
            Ok(result) => result,
            Err(_) => Err(FlowError::Navigation {
                url,
                reason: format!(
                    "no load within {}ms",
                    self.options.navigation_timeout.as_millis()
                ),
            }),
        }
    }

    async fn wait_visible(&mut self, locator: &Locator, timeout_ms: u64) -> FlowResult<()> {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(timeout_ms);
        loop {
            if self.driver.is_visible(locator).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FlowError::AssertionTimeout {
                    condition: format!("visible: {locator}"),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    timeout_ms,
                });
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn wait_url(&mut self, pattern: &UrlPattern, timeout_ms: u64) -> FlowResult<()> {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(timeout_ms);
        loop {
            let url = self.driver.current_url().await?;
            if pattern.matches(&url) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FlowError::AssertionTimeout {
                    condition: format!("url matches {pattern} (last url: {url})"),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    timeout_ms,
                });
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }
}

/// Resolve a step path against the base URL; absolute URLs pass through
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_relative_paths() {
        assert_eq!(
            join_url("http://localhost:5173", "/login"),
            "http://localhost:5173/login"
        );
        assert_eq!(
            join_url("http://localhost:5173/", "/login"),
            "http://localhost:5173/login"
        );
        assert_eq!(
            join_url("http://localhost:5173", "login"),
            "http://localhost:5173/login"
        );
    }

    #[test]
    fn test_join_url_absolute_passthrough() {
        assert_eq!(
            join_url("http://localhost:5173", "https://example.com/x"),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_session_options_default() {
        let options = SessionOptions::default();
        assert_eq!(options.base_url, "http://localhost:5173");
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.navigation_timeout, Duration::from_secs(15));
    }
}
