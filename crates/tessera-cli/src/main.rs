//! Tessera CLI - inspect and convert saved image datasets

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show summary metadata and dimensions of a saved dataset
    Info {
        /// Dataset directory
        path: PathBuf,
    },

    /// Rewrite a saved dataset in another layout
    Convert {
        /// Dataset directory to read
        source: PathBuf,

        /// New dataset directory; must not exist or be empty
        destination: PathBuf,

        /// Output layout: multipage or single-plane
        #[arg(short, long, default_value = "multipage")]
        mode: String,

        /// JSON file with datastore settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Info { path } => {
            commands::info::execute(path)?;
        }
        Commands::Convert {
            source,
            destination,
            mode,
            config,
        } => {
            commands::convert::execute(source, destination, &mode, config)?;
        }
    }

    Ok(())
}
