//! Compare command - screenshot baseline management

use clap::{Args, Subcommand};
use serde::Serialize;

use webproof_flow::FlowError;
use webproof_runner::{BaselineComparer, BaselineDiff};

use crate::config::WebproofConfig;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum CompareCommands {
    /// Compare a captured screenshot against its stored baseline
    Check(CheckArgs),

    /// Promote a captured screenshot to be the new baseline
    Update(UpdateArgs),

    /// List stored baselines
    Baselines,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Artifact name (the screenshot's file stem)
    pub name: String,

    /// Allowed pixel difference in percent, overriding the configured value
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Artifact name (the screenshot's file stem)
    pub name: String,
}

pub fn execute(
    cmd: CompareCommands,
    config: WebproofConfig,
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let comparer = BaselineComparer::new(config.baseline_options())?;

    match cmd {
        CompareCommands::Check(args) => {
            let diff = match comparer.compare(&args.name, args.threshold) {
                Ok(diff) => diff,
                Err(FlowError::BaselineMissing(name)) => {
                    output::print_warning(&format!(
                        "no baseline for '{name}' - run `webproof compare update {name}` to create one"
                    ));
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };

            output::print_item(&DiffRow::new(&args.name, &diff), format);

            if diff.matches {
                output::print_success(&format!("{} matches baseline", args.name));
                Ok(true)
            } else {
                output::print_error(&format!(
                    "{} differs from baseline by {:.2}%",
                    args.name, diff.diff_percent
                ));
                if let Some(path) = &diff.diff_image_path {
                    output::print_info(&format!("diff image: {}", path.display()));
                }
                Ok(false)
            }
        }
        CompareCommands::Update(args) => {
            comparer.update_baseline(&args.name)?;
            output::print_success(&format!("baseline updated: {}", args.name));
            Ok(true)
        }
        CompareCommands::Baselines => {
            let rows: Vec<BaselineRow> = comparer
                .list_baselines()?
                .into_iter()
                .map(|name| BaselineRow { name })
                .collect();
            output::print_list(&rows, format);
            Ok(true)
        }
    }
}

#[derive(Serialize)]
struct DiffRow {
    name: String,
    matches: bool,
    diff_percent: f64,
    diff_pixels: u64,
    total_pixels: u64,
    diff_image: Option<String>,
}

impl DiffRow {
    fn new(name: &str, diff: &BaselineDiff) -> Self {
        Self {
            name: name.to_string(),
            matches: diff.matches,
            diff_percent: diff.diff_percent,
            diff_pixels: diff.diff_pixels,
            total_pixels: diff.total_pixels,
            diff_image: diff
                .diff_image_path
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }
}

impl TableDisplay for DiffRow {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "MATCHES", "DIFF %", "DIFF PIXELS", "DIFF IMAGE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.matches.to_string(),
            format!("{:.2}", self.diff_percent),
            format!("{}/{}", self.diff_pixels, self.total_pixels),
            self.diff_image.clone().unwrap_or_default(),
        ]
    }
}

#[derive(Serialize)]
struct BaselineRow {
    name: String,
}

impl TableDisplay for BaselineRow {
    fn headers() -> Vec<&'static str> {
        vec!["BASELINE"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_diff_row_from_mismatch() {
        let diff = BaselineDiff {
            matches: false,
            diff_percent: 12.5,
            diff_pixels: 125,
            total_pixels: 1000,
            diff_image_path: Some(PathBuf::from("test-results/diffs/login-diff.png")),
            actual_hash: "aa".to_string(),
            baseline_hash: "bb".to_string(),
        };

        let row = DiffRow::new("login", &diff).row();
        assert_eq!(row[0], "login");
        assert_eq!(row[1], "false");
        assert_eq!(row[2], "12.50");
        assert_eq!(row[3], "125/1000");
        assert!(row[4].ends_with("login-diff.png"));
    }
}
