//! Doctor command - check the local environment

use std::time::Duration;

use webproof_flow::Flow;
use webproof_runner::detect_chrome;

use crate::config::WebproofConfig;
use crate::output;

/// Check browser, flows, target app and output directory. Browser and
/// flow checks must pass; an unreachable app is only a warning since
/// `run` can spawn one.
pub async fn execute(config: WebproofConfig) -> anyhow::Result<bool> {
    let mut ok = true;

    // Browser
    let executable = config.browser.executable.clone().or_else(detect_chrome);
    match executable {
        Some(path) if path.exists() => {
            output::print_success(&format!("browser: {}", path.display()));
        }
        Some(path) => {
            output::print_error(&format!("browser not found at {}", path.display()));
            ok = false;
        }
        None => {
            output::print_error(
                "no chromium browser found - install one or set browser.executable",
            );
            ok = false;
        }
    }

    // Flows
    match Flow::load_all(&config.runner.flows_dir) {
        Ok(flows) if flows.is_empty() => {
            output::print_warning(&format!(
                "no flows in {}",
                config.runner.flows_dir.display()
            ));
        }
        Ok(flows) => {
            output::print_success(&format!(
                "flows: {} parsed from {}",
                flows.len(),
                config.runner.flows_dir.display()
            ));
        }
        Err(e) => {
            output::print_error(&format!("flows: {e}"));
            ok = false;
        }
    }

    // Target app
    if let Some(app) = &config.app {
        output::print_info(&format!(
            "app spawn configured: {} {}",
            app.command.display(),
            app.args.join(" ")
        ));
    } else {
        let url = config.runner.base_url.clone();
        match probe(&url).await {
            Ok(status) => {
                output::print_success(&format!("app answers at {url} ({status})"));
            }
            Err(_) => {
                output::print_warning(&format!(
                    "app not reachable at {url} - start it or configure [app]"
                ));
            }
        }
    }

    // Output directory
    match std::fs::create_dir_all(&config.runner.output_dir) {
        Ok(()) => {
            output::print_success(&format!(
                "output dir writable: {}",
                config.runner.output_dir.display()
            ));
        }
        Err(e) => {
            output::print_error(&format!(
                "output dir {}: {e}",
                config.runner.output_dir.display()
            ));
            ok = false;
        }
    }

    if ok {
        output::print_success("environment looks good");
    } else {
        output::print_error("environment has problems");
    }

    Ok(ok)
}

async fn probe(url: &str) -> anyhow::Result<u16> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let response = client.get(url).send().await?;
    Ok(response.status().as_u16())
}
