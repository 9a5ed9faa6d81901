//! Prism CLI - search a folder of images by meaning, not filename.
//!
//! Prism embeds your images and your query into a shared semantic
//! space (SigLIP) and prints the images ranked by similarity. An
//! optional ImageNet classifier refines the ranking with predicted
//! object labels.
//!
//! # Usage
//!
//! ```bash
//! # Download models once
//! prism models download
//!
//! # Search a folder
//! prism search ./photos "a snowy mountain at sunset"
//!
//! # Refine with the auxiliary classifier
//! prism search ./photos "golden retriever" --classifier
//!
//! # View configuration
//! prism config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Prism - semantic image search for local folders.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank the images in a folder by similarity to a query
    Search(cli::search::SearchArgs),

    /// Manage AI models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match prism_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `prism config path`."
            );
            prism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Search(args) => cli::search::execute(args).await,
        Commands::Models(args) => cli::models::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
