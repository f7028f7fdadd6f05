//! TinEye CLI - command-line client for the TinEye services APIs.
//!
//! Drives a MatchEngine, MobileEngine, WineEngine or MulticolorEngine API
//! from the shell and prints each decoded response as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Add an image under its own collection path
//! tineye add banana.jpg --as folder/banana.jpg
//!
//! # Search with a URL
//! tineye search --url https://tineye.com/images/meloncat.jpg
//!
//! # Color search on a multicolor engine
//! tineye --engine multicolorengine colors search 255,112,223 ffffff --weights 70 30
//!
//! # View configuration
//! tineye config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// TinEye - command-line client for the TinEye image matching services.
#[derive(Parser, Debug)]
#[command(name = "tineye")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    connection: cli::ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the API server is up
    Ping,

    /// Count the images in the collection
    Count,

    /// List collection paths
    List(cli::collection::ListArgs),

    /// Remove images from the collection
    Delete(cli::collection::DeleteArgs),

    /// Upload images to the collection
    Add(cli::collection::AddArgs),

    /// Add images the service downloads from URLs
    AddUrl(cli::collection::AddUrlArgs),

    /// Search the collection with an image, URL or collection path
    Search(cli::search::SearchArgs),

    /// Compare two images (match engines only)
    Compare(cli::search::CompareArgs),

    /// Color search, extraction and counting (multicolorengine only)
    Colors(cli::colors::ColorsArgs),

    /// Inspect and update image metadata (multicolorengine only)
    Metadata(cli::metadata::MetadataArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = cli::config_or_default(tineye_core::Config::load());
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("TinEye CLI v{}", tineye_core::VERSION);

    cli.connection.apply(&mut config);
    let config = &config;
    match cli.command {
        Commands::Ping => cli::collection::ping(config).await,
        Commands::Count => cli::collection::count(config).await,
        Commands::List(args) => cli::collection::list(config, args).await,
        Commands::Delete(args) => cli::collection::delete(config, args).await,
        Commands::Add(args) => cli::collection::add(config, args).await,
        Commands::AddUrl(args) => cli::collection::add_url(config, args).await,
        Commands::Search(args) => cli::search::search(config, args).await,
        Commands::Compare(args) => cli::search::compare(config, args).await,
        Commands::Colors(args) => cli::colors::execute(config, args).await,
        Commands::Metadata(args) => cli::metadata::execute(config, args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
