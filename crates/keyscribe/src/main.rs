//! Keyscribe CLI - describe images and derive short- and long-tail keywords.
//!
//! An image is captioned by a hosted image-to-text model, and the caption is
//! turned into keyphrases by a hosted keyphrase model. Both calls go through
//! a small proxy that forwards the caller's Hugging Face token.
//!
//! # Usage
//!
//! ```bash
//! # Run the proxy
//! keyscribe serve
//!
//! # Describe images through it
//! HUGGING_FACE_TOKEN=hf_... keyscribe describe photo.jpg
//!
//! # View configuration
//! keyscribe config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Keyscribe - image descriptions and keywords from hosted inference models.
#[derive(Parser, Debug)]
#[command(name = "keyscribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "KEYSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the credential-forwarding inference proxy
    Serve(cli::serve::ServeArgs),

    /// Caption images and derive short- and long-tail keywords
    Describe(cli::describe::DescribeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may hold HUGGING_FACE_TOKEN and RUST_LOG, so load it before anything reads them
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => keyscribe_core::Config::load_from(path),
        None => keyscribe_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e.into()),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `keyscribe config path`."
            );
            keyscribe_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Keyscribe v{}", keyscribe_core::VERSION);
    match dotenv {
        Ok(path) => tracing::debug!(".env loaded from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Could not load .env file: {e}"),
    }

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Describe(args) => cli::describe::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config, config).await,
    }
}
