//! Healthdesk CLI
//!
//! Main entry point for the healthdesk command-line tool: serves the
//! health-information HTTP API and answers queries from the terminal.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, KbCommand, ServeCommand};
use healthdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// Healthdesk - source-grounded health information with safety triage
#[derive(Parser, Debug)]
#[command(name = "healthdesk")]
#[command(about = "Source-grounded health information with safety triage", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "HEALTHDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "HEALTHDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Documents retrieved per query
    #[arg(short = 'k', long, global = true)]
    top_k: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "HEALTHDESK_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Answer a single query
    Ask(AskCommand),

    /// Inspect the knowledge base
    Kb(KbCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file decide which YAML is merged, so they go in first
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        _ => None,
    };

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        bind,
        cli.top_k,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.log_json,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Healthdesk starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Knowledge directories: {:?}", config.resolved_kb_dirs());

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Kb(_) => "kb",
    };

    // Route to command handlers
    let result = async {
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Kb(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(tracing::info_span!("command", name = command_name))
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
