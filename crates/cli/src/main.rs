//! sitecheck CLI - Main Entry Point
//!
//! Loads declarative check suites, runs them against live sites, and
//! reports the outcome. Exit code 0 means every check passed, 1 means some
//! check failed or was skipped, 2 means the run could not start.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{list, run, validate, Selection};
use sitecheck::config::{SiteCheckConfig, CONFIG_FILE_NAME};

/// sitecheck - declarative HTTP and browser checks
#[derive(Parser)]
#[command(name = "sitecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE_NAME, env = "SITECHECK_CONFIG", global = true)]
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
    /// Run checks and report results
    Run(run::RunArgs),

    /// Check suite files without fetching anything
    Validate(Selection),

    /// List the checks a selection resolves to
    List(Selection),

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
        .with_writer(std::io::stderr)
        .init();

    match async_main(cli).await {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}

async fn async_main(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Run(args) => {
            let config = SiteCheckConfig::load(&cli.config)?;
            run::execute(args, config, cli.format).await
        }
        Commands::Validate(selection) => validate::execute(selection),
        Commands::List(selection) => {
            list::execute(selection, cli.format)?;
            Ok(true)
        }
        Commands::Version => {
            println!("sitecheck v{}", env!("CARGO_PKG_VERSION"));
            println!("Declarative HTTP and browser checks");
            Ok(true)
        }
    }
}
