//! Casefile CLI
//!
//! Main entry point for the casefile command-line tool.
//! Answers investigator questions about the exchange hack from a case-file corpus.

mod commands;

use casefile_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppResult,
};
use clap::{Parser, Subcommand};
use commands::{CheckCommand, InvestigateCommand, RetrieveCommand};
use std::path::PathBuf;

/// Casefile - evidence-grounded answers from the case files
#[derive(Parser, Debug)]
#[command(name = "casefile")]
#[command(about = "Evidence-grounded investigation reports from case files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CASEFILE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CASEFILE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CASEFILE_LOG_JSON")]
    log_json: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "CASEFILE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "CASEFILE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a full investigation and print the report
    Investigate(InvestigateCommand),

    /// Check whether a query is about the case
    Check(CheckCommand),

    /// Retrieve candidate evidence without reranking
    Retrieve(RetrieveCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Workspace and config file decide which YAML gets merged
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    let mut config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    if cli.log_json {
        config.log_json = true;
    }

    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, format)?;

    tracing::info!("Casefile CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Investigate(_) => "investigate",
        Commands::Check(_) => "check",
        Commands::Retrieve(_) => "retrieve",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Investigate(cmd) => cmd.execute(&config).await,
        Commands::Check(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
