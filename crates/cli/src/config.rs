//! Webproof configuration
//!
//! Loaded from `webproof.toml` when present; every section falls back to
//! defaults so a missing or partial file is fine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use webproof_runner::{AppConfig, BaselineOptions, BrowserOptions, RunnerConfig, SessionOptions};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebproofConfig {
    pub runner: RunnerSection,
    pub browser: BrowserSection,
    /// App to spawn before running; omit to target an already-running app
    pub app: Option<AppSection>,
    pub baseline: BaselineSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Base URL flows resolve relative paths against
    pub base_url: String,

    /// Directory holding flow YAML files
    pub flows_dir: PathBuf,

    /// Directory for results.json
    pub output_dir: PathBuf,

    /// Directory screenshot artifacts land in
    pub artifact_dir: PathBuf,

    /// Interval between assertion polls
    pub poll_interval_ms: u64,

    /// Budget for a single navigation
    pub navigation_timeout_ms: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            flows_dir: PathBuf::from("flows"),
            output_dir: PathBuf::from("test-results"),
            artifact_dir: PathBuf::from("test-results/artifacts"),
            poll_interval_ms: 100,
            navigation_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Chromium executable; autodetected when unset
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: 1280,
            window_height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Executable to run
    pub command: PathBuf,

    /// Arguments passed to the executable
    pub args: Vec<String>,

    /// Extra environment variables
    pub env: BTreeMap<String, String>,

    /// Working directory for the process
    pub workdir: Option<PathBuf>,

    /// Port to serve on (omit = find a free port)
    pub port: Option<u16>,

    /// Environment variable the chosen port is passed through
    pub port_env: Option<String>,

    /// Path polled for readiness
    pub health_path: String,

    /// Budget for the app to come up
    pub startup_timeout_secs: u64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            command: PathBuf::from("npm"),
            args: vec!["run".to_string(), "dev".to_string()],
            env: BTreeMap::new(),
            workdir: None,
            port: None,
            port_env: Some("PORT".to_string()),
            health_path: "/".to_string(),
            startup_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineSection {
    pub baseline_dir: PathBuf,
    pub diff_dir: PathBuf,
    /// Allowed pixel difference, 0.0 - 100.0 percent
    pub threshold: f64,
}

impl Default for BaselineSection {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
        }
    }
}

impl WebproofConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            base_url: self.runner.base_url.clone(),
            artifact_dir: self.runner.artifact_dir.clone(),
            poll_interval: Duration::from_millis(self.runner.poll_interval_ms),
            navigation_timeout: Duration::from_millis(self.runner.navigation_timeout_ms),
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            executable: self.browser.executable.clone(),
            headless: self.browser.headless,
            window_width: self.browser.window_width,
            window_height: self.browser.window_height,
            ..BrowserOptions::default()
        }
    }

    pub fn app_config(&self) -> Option<AppConfig> {
        self.app.as_ref().map(|app| AppConfig {
            command: app.command.clone(),
            args: app.args.clone(),
            env: app.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            workdir: app.workdir.clone(),
            port: app.port,
            port_env: app.port_env.clone(),
            health_path: app.health_path.clone(),
            startup_timeout: Duration::from_secs(app.startup_timeout_secs),
        })
    }

    pub fn baseline_options(&self) -> BaselineOptions {
        BaselineOptions {
            baseline_dir: self.baseline.baseline_dir.clone(),
            actual_dir: self.runner.artifact_dir.clone(),
            diff_dir: self.baseline.diff_dir.clone(),
            threshold: self.baseline.threshold,
        }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            browser: self.browser_options(),
            session: self.session_options(),
            app: self.app_config(),
            flows_dir: self.runner.flows_dir.clone(),
            output_dir: self.runner.output_dir.clone(),
        }
    }
}
