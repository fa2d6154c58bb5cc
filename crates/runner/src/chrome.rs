//! Chromium driver over the DevTools protocol

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use webproof_flow::{FlowError, FlowResult, Locator};

use crate::dom::{self, DomOutcome};
use crate::driver::PageDriver;

/// Options for launching the browser
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Chromium executable; autodetected when unset
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub launch_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: 1280,
            window_height: 720,
            launch_timeout: Duration::from_secs(20),
        }
    }
}

/// Chromium executables probed when no path is configured
const CHROME_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Locate a Chromium executable, honoring the CHROME env var first
pub fn detect_chrome() -> Option<PathBuf> {
    std::env::var_os("CHROME")
        .map(PathBuf::from)
        .filter(|p| p.exists())
        .or_else(|| {
            CHROME_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
        })
}

/// A live Chromium instance with one attached page
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl ChromeDriver {
    /// Launch a browser and open a blank page
    pub async fn launch(options: &BrowserOptions) -> FlowResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .window_size(options.window_width, options.window_height);
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(FlowError::Launch)?;

        let (browser, mut handler) =
            tokio::time::timeout(options.launch_timeout, Browser::launch(config))
                .await
                .map_err(|_| {
                    FlowError::Launch(format!(
                        "browser did not start within {}ms",
                        options.launch_timeout.as_millis()
                    ))
                })?
                .map_err(|e| FlowError::Launch(format!("failed to launch chromium: {e}")))?;

        // The handler task pumps CDP messages until the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("CDP handler loop ended");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FlowError::Launch(format!("failed to open page: {e}")))?;

        debug!("chromium launched");
        Ok(Self {
            browser,
            page,
            handler_task,
            closed: false,
        })
    }

    /// Evaluate an action script and map its outcome to our error taxonomy
    async fn run_action(&mut self, locator: &Locator, script: String) -> FlowResult<()> {
        let outcome: DomOutcome = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| FlowError::Driver(format!("script evaluation failed: {e}")))?
            .into_value()
            .map_err(|e| FlowError::Driver(format!("malformed script result: {e}")))?;
        if outcome.ok {
            Ok(())
        } else {
            Err(outcome_failure(locator, &outcome))
        }
    }
}

/// A script reported failure: distinguish match-count problems from an
/// element that matched but could not be acted on
fn outcome_failure(locator: &Locator, outcome: &DomOutcome) -> FlowError {
    if outcome.count != 1 {
        FlowError::Locator {
            locator: locator.to_string(),
            matched: outcome.count,
        }
    } else {
        FlowError::NotInteractable {
            locator: locator.to_string(),
            reason: outcome.reason.clone(),
        }
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn goto(&mut self, url: &str) -> FlowResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| FlowError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .wait_for_navigation()
            .await
            .map_err(|e| FlowError::Navigation {
                url: url.to_string(),
                reason: format!("load did not settle: {e}"),
            })?;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> FlowResult<()> {
        self.run_action(locator, dom::fill_script(locator, value))
            .await
    }

    async fn click(&mut self, locator: &Locator) -> FlowResult<()> {
        self.run_action(locator, dom::click_script(locator)).await
    }

    async fn is_visible(&mut self, locator: &Locator) -> FlowResult<bool> {
        let outcome: DomOutcome = self
            .page
            .evaluate(dom::visible_script(locator))
            .await
            .map_err(|e| FlowError::Driver(format!("script evaluation failed: {e}")))?
            .into_value()
            .map_err(|e| FlowError::Driver(format!("malformed script result: {e}")))?;
        Ok(outcome.ok)
    }

    async fn current_url(&mut self) -> FlowResult<String> {
        self.page
            .url()
            .await
            .map_err(|e| FlowError::Driver(format!("could not read page url: {e}")))?
            .ok_or_else(|| FlowError::Driver("page reported no url".to_string()))
    }

    async fn screenshot(&mut self) -> FlowResult<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(|e| FlowError::Driver(format!("screenshot failed: {e}")))
    }

    async fn close(&mut self) -> FlowResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            debug!("browser wait: {e}");
        }
        self.handler_task.abort();
        debug!("chromium released");
        Ok(())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        // normal paths close() first; this only stops the pump on leaks
        if !self.closed {
            self.handler_task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_options_default() {
        let options = BrowserOptions::default();
        assert!(options.headless);
        assert!(options.executable.is_none());
        assert_eq!(options.window_width, 1280);
        assert_eq!(options.window_height, 720);
    }

    #[test]
    fn test_detect_chrome_does_not_panic() {
        // Presence depends on the host; only the lookup itself is under test
        let _ = detect_chrome();
    }

    #[test]
    fn test_zero_matches_maps_to_locator_error() {
        let outcome = DomOutcome {
            ok: false,
            count: 0,
            reason: String::new(),
        };
        let err = outcome_failure(&Locator::id("missing"), &outcome);
        match err {
            FlowError::Locator { matched, .. } => assert_eq!(matched, 0),
            other => panic!("expected Locator, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_matches_maps_to_locator_error() {
        let outcome = DomOutcome {
            ok: false,
            count: 3,
            reason: String::new(),
        };
        let err = outcome_failure(&Locator::label("Email"), &outcome);
        match err {
            FlowError::Locator { matched, .. } => assert_eq!(matched, 3),
            other => panic!("expected Locator, got {other:?}"),
        }
    }

    #[test]
    fn test_unfillable_single_match_maps_to_not_interactable() {
        let outcome = DomOutcome {
            ok: false,
            count: 1,
            reason: "element <div> is not fillable".to_string(),
        };
        let err = outcome_failure(&Locator::id("panel"), &outcome);
        match err {
            FlowError::NotInteractable { reason, .. } => {
                assert!(reason.contains("not fillable"));
            }
            other => panic!("expected NotInteractable, got {other:?}"),
        }
    }
}
