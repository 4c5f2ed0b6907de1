//! wizcheck CLI - Main Entry Point
//!
//! Runs wizard conformance scenarios against the live service or the
//! simulated site, and inspects the wizard model.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

use commands::{config, export, graph, negative, run, scenarios, EXIT_HARNESS};

/// wizcheck - conformance harness for multi-step web questionnaires
#[derive(Parser)]
#[command(name = "wizcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness config file
    #[arg(short, long, default_value = "wizcheck.toml", env = "WIZCHECK_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios and write test-results.json
    Run(run::RunArgs),

    /// Show nodes, URL contract, edges and unresolved answers
    Graph(graph::GraphArgs),

    /// List declared scenarios
    Scenarios(scenarios::ScenariosArgs),

    /// Exercise one node's negative cases
    Negative(negative::NegativeArgs),

    /// Print the wizard model
    Export(export::ExportArgs),

    /// Manage the config file
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    // Logs go to stderr so structured stdout stays parseable
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, &cli.config, cli.format).await,
        Commands::Graph(args) => graph::execute(args, cli.format).await,
        Commands::Scenarios(args) => scenarios::execute(args, cli.format).await,
        Commands::Negative(args) => negative::execute(args, &cli.config, cli.format).await,
        Commands::Export(args) => export::execute(args, cli.format).await,
        Commands::Config(cmd) => config::execute(cmd, &cli.config).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(EXIT_HARNESS)
        }
    }
}
