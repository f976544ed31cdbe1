//! powledger CLI Application
//!
//! Drives an in-memory ledger: wallets, a genesis output, mining and
//! validation.

use clap::{Parser, Subcommand};
use powledger::cli;
use powledger::config::LedgerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "powledger")]
#[command(version)]
#[command(about = "A single-node proof-of-work ledger", long_about = None)]
struct Cli {
    /// JSON file with ledger settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mining difficulty (leading zero hex characters), overrides the config file
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Minimum transaction value, overrides the config file
    #[arg(short, long)]
    minimum: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the two-wallet transfer scenario, validating after every block
    Demo,

    /// Build a chain, tamper with it and show validation rejecting it
    Tamper,

    /// Generate a new key pair
    Keygen,
}

fn load_config(cli: &Cli) -> Result<LedgerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_json_file(path)?,
        None => LedgerConfig::default(),
    };

    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(minimum) = cli.minimum {
        config.minimum_transaction = minimum;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Keygen => cli::cmd_keygen()?,
        Commands::Demo => cli::cmd_demo(load_config(&cli)?)?,
        Commands::Tamper => cli::cmd_tamper(load_config(&cli)?)?,
    }

    Ok(())
}
