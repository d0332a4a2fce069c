//! Quotes CLI
//!
//! Command-line interface for quotes - a local quote collection kept in
//! step with a remote quote source.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotes_core::{Config, Resolution, StorageError, Store};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quotes")]
#[command(about = "Quotes - local quote collection with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a quote
    Add {
        /// Quote text
        text: String,
        /// Category
        #[arg(short, long)]
        category: String,
    },
    /// List quotes
    #[command(alias = "ls")]
    List {
        /// Only this category (defaults to the selected filter)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Remove a quote
    #[command(alias = "rm")]
    Remove {
        /// Quote ID
        id: String,
    },
    /// List all categories
    Categories,
    /// Show or change the selected category filter
    Filter {
        /// Category to select, or "all"
        category: Option<String>,
    },
    /// Import quotes from a JSON file
    Import {
        /// File containing a JSON array of quotes
        file: PathBuf,
    },
    /// Export all quotes to a JSON file
    Export {
        /// Output file (default: quotes-YYYY-MM-DD.json)
        file: Option<PathBuf>,
    },
    /// Run one reconciliation pass against the remote source
    Sync,
    /// Reconcile periodically until interrupted
    Watch {
        /// Seconds between passes (default: sync_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// List pending conflicts
    Conflicts,
    /// Resolve a pending conflict
    Resolve {
        /// Conflict ID
        id: String,
        /// Side to keep: local or server
        #[arg(short, long)]
        keep: Resolution,
    },
    /// Show status (storage, sync, counts)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, remote_url, sync_enabled, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Some(hint) = result.as_ref().err().and_then(storage_hint) {
        eprintln!("Hint: {}", hint);
    }
    result
}

/// Recovery advice for a recoverable storage failure anywhere in the chain
fn storage_hint(error: &anyhow::Error) -> Option<&'static str> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .filter(|e| e.is_recoverable())
        .and_then(StorageError::recovery_suggestion)
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut store = Store::open_with_config(config)?;

    match cli.command {
        Commands::Add { text, category } => {
            commands::quote::add(&mut store, text, category, &output)
        }
        Commands::List { category } => commands::quote::list(&store, category, &output),
        Commands::Remove { id } => commands::quote::remove(&mut store, id, &output),
        Commands::Categories => commands::category::list(&store, &output),
        Commands::Filter { category } => commands::category::filter(&mut store, category, &output),
        Commands::Import { file } => commands::transfer::import(&mut store, file, &output),
        Commands::Export { file } => commands::transfer::export(&store, file, &output),
        Commands::Sync => commands::sync::sync(store, &output).await,
        Commands::Watch { interval } => commands::sync::watch(store, interval, &output).await,
        Commands::Conflicts => commands::conflict::list(&store, &output),
        Commands::Resolve { id, keep } => {
            commands::conflict::resolve(&mut store, id, keep, &output)
        }
        Commands::Status => commands::status::show(&store, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// File-based logging, only if QUOTES_LOG is set
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("QUOTES_LOG") else {
        return;
    };

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "quotes_core={},quotes_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
