//! Run command - execute verification flows

use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use webproof_flow::{FlowOutcome, SuiteReport};
use webproof_runner::{AppConfig, FlowRunner};

use crate::config::WebproofConfig;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Flow names to run (default: every flow in the flows directory)
    pub names: Vec<String>,

    /// Only run flows carrying this tag
    #[arg(long, conflicts_with = "names")]
    pub tag: Option<String>,

    /// Target an already-running app at this URL instead of spawning one
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory holding flow YAML files
    #[arg(long)]
    pub flows: Option<PathBuf>,

    /// Directory screenshot artifacts land in
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// Spawn this command as the app under verification, e.g. "npm run dev"
    #[arg(long, conflicts_with = "base_url")]
    pub serve: Option<String>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,
}

pub async fn execute(
    args: RunArgs,
    config: WebproofConfig,
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let mut runner_config = config.runner_config();

    if let Some(dir) = args.flows {
        runner_config.flows_dir = dir;
    }
    if let Some(dir) = args.artifact_dir {
        runner_config.session.artifact_dir = dir;
    }
    if args.headed {
        runner_config.browser.headless = false;
    }
    if let Some(serve) = &args.serve {
        runner_config.app = Some(parse_serve_command(serve, config.app_config())?);
    }
    if let Some(base_url) = args.base_url {
        // an explicit target means nothing to spawn
        runner_config.session.base_url = base_url;
        runner_config.app = None;
    }

    debug!(
        "flows: {}, target: {}",
        runner_config.flows_dir.display(),
        runner_config.session.base_url
    );

    let mut runner = FlowRunner::with_config(runner_config);

    let report = if !args.names.is_empty() {
        runner.run_named(&args.names).await?
    } else if let Some(tag) = &args.tag {
        runner.run_tagged(tag).await?
    } else {
        runner.run_all().await?
    };

    runner.stop_app()?;
    runner.write_report(&report)?;

    output::print_list(&report.outcomes, format);
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        print_summary(&report);
    }

    Ok(report.is_success())
}

/// Split a `--serve` command line into an app config, inheriting every
/// non-command setting from `[app]` when configured
fn parse_serve_command(serve: &str, configured: Option<AppConfig>) -> anyhow::Result<AppConfig> {
    let mut parts = serve.split_whitespace();
    let command = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("--serve command is empty"))?;

    let mut app = configured.unwrap_or_default();
    app.command = PathBuf::from(command);
    app.args = parts.map(String::from).collect();
    Ok(app)
}

fn print_summary(report: &SuiteReport) {
    let passed = format!("{} passed", report.passed);
    if report.is_success() {
        println!("{} ({} ms)", passed.green().bold(), report.duration_ms);
    } else {
        let failed = format!("{} failed", report.failed);
        println!(
            "{}, {} ({} ms)",
            passed.green(),
            failed.red().bold(),
            report.duration_ms
        );
    }
}

impl TableDisplay for FlowOutcome {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "STATUS", "DURATION", "ERROR"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            if self.passed { "pass" } else { "fail" }.to_string(),
            format!("{} ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webproof_flow::FlowError;

    #[test]
    fn test_outcome_table_row() {
        let err = FlowError::Navigation {
            url: "http://localhost:5173/login".to_string(),
            reason: "connection refused".to_string(),
        };
        let outcome = FlowOutcome::from_error("login-check", 42, &err);

        let row = outcome.row();
        assert_eq!(row[0], "login-check");
        assert_eq!(row[1], "fail");
        assert_eq!(row[2], "42 ms");
        assert!(row[3].contains("connection refused"));
    }

    #[test]
    fn test_headers_match_row_width() {
        let err = FlowError::Launch("no chrome".to_string());
        let outcome = FlowOutcome::from_error("x", 0, &err);
        assert_eq!(FlowOutcome::headers().len(), outcome.row().len());
    }

    #[test]
    fn test_parse_serve_command_splits_args() {
        let app = parse_serve_command("npm run dev", None).unwrap();
        assert_eq!(app.command, PathBuf::from("npm"));
        assert_eq!(app.args, vec!["run".to_string(), "dev".to_string()]);
        // defaults still apply when no [app] section is configured
        assert_eq!(app.port_env.as_deref(), Some("PORT"));
    }

    #[test]
    fn test_parse_serve_command_rejects_empty() {
        assert!(parse_serve_command("   ", None).is_err());
    }
}
