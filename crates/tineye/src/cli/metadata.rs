//! The `tineye metadata` command (multicolorengine only).

use super::{checked_json, connect, print_response, require_multicolor};
use clap::{Args, Subcommand};
use tineye_core::{CollectionFilter, ColorQueryable, Config, MetadataQueryable};

/// Arguments for the `metadata` command.
#[derive(Args, Debug)]
pub struct MetadataArgs {
    #[command(subcommand)]
    pub command: MetadataCommand,
}

/// Metadata subcommands.
#[derive(Subcommand, Debug)]
pub enum MetadataCommand {
    /// Show the metadata stored for collection images
    Get {
        #[arg(required = true)]
        filepaths: Vec<String>,
    },

    /// Show the metadata keys that can be searched
    Searchable,

    /// Show the metadata keys a search can return
    Returnable,

    /// Replace the metadata of one collection image
    Update {
        /// Collection path of the image
        filepath: String,

        /// New metadata, as JSON
        metadata: String,
    },

    /// Count collection images matching each metadata query
    Count {
        /// Metadata queries, as JSON
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

/// Execute the metadata command.
pub async fn execute(config: &Config, args: MetadataArgs) -> anyhow::Result<()> {
    let engine = connect(config)?;
    let client = require_multicolor(&engine, "metadata")?;

    match args.command {
        MetadataCommand::Get { filepaths } => {
            print_response(&client.get_metadata(&filepaths).await?)
        }
        MetadataCommand::Searchable => print_response(&client.get_search_metadata().await?),
        MetadataCommand::Returnable => print_response(&client.get_return_metadata().await?),
        MetadataCommand::Update { filepath, metadata } => {
            let metadata = checked_json(&metadata)?;
            print_response(&client.update_metadata(&[filepath.as_str()], &[metadata]).await?)
        }
        MetadataCommand::Count { queries } => {
            for query in &queries {
                checked_json(query)?;
            }
            print_response(
                &client
                    .count_metadata(&queries, &CollectionFilter::All)
                    .await?,
            )
        }
    }
}
