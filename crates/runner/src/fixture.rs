//! App fixture - spawning and health checking the app under verification

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use webproof_flow::{FlowError, FlowResult};

/// Handle to the running app process
#[derive(Debug)]
pub struct AppHandle {
    child: Child,
    base_url: String,
    pub port: u16,
}

impl AppHandle {
    /// Spawn the app and wait until it answers health checks
    pub async fn spawn(config: AppConfig) -> FlowResult<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let base_url = format!("http://127.0.0.1:{port}");

        info!("spawning app on port {port}");

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);
        if let Some(dir) = &config.workdir {
            cmd.current_dir(dir);
        }
        if let Some(var) = &config.port_env {
            cmd.env(var, port.to_string());
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            FlowError::Fixture(format!(
                "failed to spawn {}: {e}",
                config.command.display()
            ))
        })?;

        let handle = AppHandle {
            child,
            base_url,
            port,
        };

        handle
            .wait_for_ready(&config.health_path, config.startup_timeout)
            .await?;

        info!("app is ready at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll the health endpoint until it answers or the budget runs out
    async fn wait_for_ready(&self, health_path: &str, budget: Duration) -> FlowResult<()> {
        let health_url = format!("{}{}", self.base_url, health_path);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| FlowError::Fixture(format!("http client: {e}")))?;

        let start = std::time::Instant::now();
        let mut attempts = 0u32;

        while start.elapsed() < budget {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("waiting for app to start...");
                    }
                    // connection refused is expected while the app boots
                    if !e.is_connect() {
                        warn!("health check error: {e}");
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(FlowError::Fixture(format!(
            "app at {health_url} not ready after {attempts} attempt(s)"
        )))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the app, SIGTERM first, then kill
    pub fn stop(&mut self) -> FlowResult<()> {
        info!("stopping app (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning the app under verification
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Executable to run
    pub command: PathBuf,

    /// Arguments passed to the executable
    pub args: Vec<String>,

    /// Extra environment variables
    pub env: Vec<(String, String)>,

    /// Working directory for the process
    pub workdir: Option<PathBuf>,

    /// Port to serve on (None = find a free port)
    pub port: Option<u16>,

    /// Environment variable the chosen port is passed through
    pub port_env: Option<String>,

    /// Path polled for readiness
    pub health_path: String,

    /// Budget for the app to come up
    pub startup_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("npm"),
            args: vec!["run".to_string(), "dev".to_string()],
            env: Vec::new(),
            workdir: None,
            port: None,
            port_env: Some("PORT".to_string()),
            health_path: "/".to_string(),
            // dev servers compile on first boot, give them room
            startup_timeout: Duration::from_secs(60),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.health_path, "/");
        assert_eq!(config.port_env.as_deref(), Some("PORT"));
        assert!(config.port.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_fails_when_app_never_answers() {
        // a process that runs but never serves HTTP
        let config = AppConfig {
            command: PathBuf::from("sleep"),
            args: vec!["5".to_string()],
            port_env: None,
            startup_timeout: Duration::from_millis(300),
            ..AppConfig::default()
        };

        let err = AppHandle::spawn(config).await.unwrap_err();
        assert_eq!(err.kind(), webproof_flow::ErrorKind::Fixture);
        assert!(err.to_string().contains("not ready"));
    }

    #[tokio::test]
    async fn test_spawn_fails_for_missing_command() {
        let config = AppConfig {
            command: PathBuf::from("/nonexistent/webproof-test-app"),
            ..AppConfig::default()
        };

        let err = AppHandle::spawn(config).await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
