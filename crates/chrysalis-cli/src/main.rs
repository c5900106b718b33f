// crates/chrysalis-cli/src/main.rs
//
// CLI entrypoint for Chrysalis.
//
// Initializes tracing, parses CLI arguments, loads configuration, and runs
// the evolve, verify, or select subcommand.

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use commands::evolve::EvolveCmd;
use commands::select::SelectCmd;
use commands::verify::VerifyCmd;
use config::ChrysalisConfig;

/// Chrysalis: generate, publish, and verify evolving collectible stages.
#[derive(Parser, Debug)]
#[command(
    name = "chrysalis",
    version = "0.1.0",
    about = "Generate and publish evolution chains for evolving collectibles"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.chrysalis/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate and publish genesis plus evolved stages from a base image.
    Evolve(EvolveCmd),

    /// Fetch a published chain back and check its stage links.
    Verify(VerifyCmd),

    /// Pick the reference to surface for a token's current on-chain stage.
    Select(SelectCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found.
    let loaded = ChrysalisConfig::load(&cli.config);
    let log_level = match &loaded {
        Ok(cfg) => cfg.log_level.clone(),
        Err(_) => ChrysalisConfig::default().log_level,
    };

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                cli.config,
                e
            );
            ChrysalisConfig::default()
        }
    };

    match &cli.command {
        Commands::Evolve(cmd) => commands::evolve::run(cmd, &config).await?,
        Commands::Verify(cmd) => commands::verify::run(cmd, &config).await?,
        Commands::Select(cmd) => commands::select::run(cmd)?,
    }

    Ok(())
}
