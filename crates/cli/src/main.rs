//! Strata CLI: the main entry point.
//!
//! Commands:
//! - `ask`: Answer one query through the full pipeline
//! - `layers`: Show effective layer settings and the priority table
//! - `config`: Print the default, effective or path of the configuration
//! - `doctor`: Diagnose configuration, providers and corpora

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata — multi-tenant layered-retrieval query orchestrator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.strata/config.toml)
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Ask(commands::ask::AskArgs),

    /// Show layer enable flags, timeouts and the priority table
    Layers,

    /// Configuration helpers (prints the default TOML without a subcommand)
    Config {
        #[command(subcommand)]
        action: Option<commands::config_cmd::ConfigAction>,
    },

    /// Diagnose configuration health
    Doctor,
}

fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        // `config` and `doctor` must work even when the file does not validate.
        Commands::Config { action } => commands::config_cmd::run(action, config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Ask(args) => {
            let config = commands::load_config(config_path)?;
            init_tracing(cli.verbose, &config.logging);
            commands::ask::run(&config, args).await?
        }
        Commands::Layers => {
            let config = commands::load_config(config_path)?;
            init_tracing(cli.verbose, &config.logging);
            commands::layers::run(&config)?
        }
    }

    Ok(())
}
