//! List command - show available flows

use clap::Args;
use std::path::PathBuf;

use webproof_flow::Flow;

use crate::config::WebproofConfig;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ListArgs {
    /// Only show flows carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Directory holding flow YAML files
    #[arg(long)]
    pub flows: Option<PathBuf>,
}

pub fn execute(
    args: ListArgs,
    config: WebproofConfig,
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let dir = args.flows.unwrap_or(config.runner.flows_dir);
    let mut flows = Flow::load_all(&dir)?;

    if let Some(tag) = &args.tag {
        flows.retain(|f| f.tags.contains(tag));
    }

    output::print_list(&flows, format);
    Ok(true)
}

impl TableDisplay for Flow {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "STEPS", "TAGS", "DESCRIPTION"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.steps.len().to_string(),
            self.tags.join(", "),
            self.description.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use webproof_flow::{Locator, Step};

    #[test]
    fn test_shipped_flows_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../flows");
        let flows = Flow::load_all(&dir).unwrap();

        assert!(flows.len() >= 3);
        assert!(flows.iter().any(|f| f.name == "login-check"));
    }

    #[test]
    fn test_register_flow_signs_back_in() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../flows");
        let flows = Flow::load_all(&dir).unwrap();
        let flow = flows.iter().find(|f| f.name == "register-login").unwrap();

        // the flow must complete the round trip: register, land on the
        // login page, sign in with the fresh account, land on the home page
        let clicks: Vec<_> = flow
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Click {
                    locator:
                        Locator::Role {
                            name: Some(name), ..
                        },
                } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(clicks, ["Register", "Login"]);

        let urls: Vec<_> = flow
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::ExpectUrl { pattern, .. } => Some(pattern.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(urls, ["/login", "/"]);

        assert!(matches!(flow.steps.last(), Some(Step::Screenshot { .. })));
    }

    #[test]
    fn test_flow_table_row() {
        let yaml = r#"
name: smoke
description: app answers at all
tags: [smoke]
steps:
  - action: navigate
    path: /
"#;
        let flow = Flow::from_yaml(yaml).unwrap();
        let row = flow.row();
        assert_eq!(row[0], "smoke");
        assert_eq!(row[1], "1");
        assert_eq!(row[2], "smoke");
        assert_eq!(Flow::headers().len(), row.len());
    }
}
