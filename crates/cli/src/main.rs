//! Webproof CLI - Main Entry Point
//!
//! Command line interface for running declarative browser verification
//! flows against a web app.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{compare, doctor, list, run};

/// Webproof - scripted browser verification
#[derive(Parser)]
#[command(name = "webproof")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "webproof.toml", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run verification flows
    Run(run::RunArgs),

    /// List available flows
    List(list::ListArgs),

    /// Compare artifacts against stored baselines
    #[command(subcommand)]
    Compare(compare::CompareCommands),

    /// Check the local environment
    Doctor,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Exit codes: 0 everything passed, 1 verification failures, 2 the
    // runner itself broke
    match dispatch(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            std::process::exit(2);
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<bool> {
    let config = config::WebproofConfig::load(&cli.config)?;

    match cli.command {
        Commands::Run(args) => run::execute(args, config, cli.format).await,
        Commands::List(args) => list::execute(args, config, cli.format),
        Commands::Compare(cmd) => compare::execute(cmd, config, cli.format),
        Commands::Doctor => doctor::execute(config).await,
        Commands::Version => {
            println!("webproof v{}", env!("CARGO_PKG_VERSION"));
            println!("Scripted browser verification over the Chrome DevTools Protocol");
            Ok(true)
        }
    }
}
