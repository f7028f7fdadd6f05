//! Collection management commands: `ping`, `count`, `list`, `delete`, `add`
//! and `add-url`.

use super::{checked_json, connect, print_response, read_image};
use clap::Args;
use std::path::PathBuf;
use tineye_core::{
    Collection, Config, EngineClient, ImageDescriptor, MetadataQueryable, DEFAULT_LIST_LIMIT,
};

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Skip this many collection paths
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Return at most this many collection paths
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: u32,
}

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Collection paths to remove
    #[arg(required = true)]
    pub filepaths: Vec<String>,
}

/// Arguments for the `add` command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Image files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Collection path to store a single image under (defaults to the file path)
    #[arg(long = "as", value_name = "COLLECTION_PATH")]
    pub collection_filepath: Option<String>,

    /// JSON metadata attached to every image (multicolorengine only)
    #[arg(long)]
    pub metadata: Option<String>,

    /// Keep the image background when indexing colors (multicolorengine only)
    #[arg(long)]
    pub keep_background: bool,
}

/// Arguments for the `add-url` command.
#[derive(Args, Debug)]
pub struct AddUrlArgs {
    /// Image URLs for the service to download
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Collection path to store a single image under (defaults to the URL's file name)
    #[arg(long = "as", value_name = "COLLECTION_PATH")]
    pub collection_filepath: Option<String>,

    /// JSON metadata attached to every image (multicolorengine only)
    #[arg(long)]
    pub metadata: Option<String>,

    /// Keep the image background when indexing colors (multicolorengine only)
    #[arg(long)]
    pub keep_background: bool,
}

pub async fn ping(config: &Config) -> anyhow::Result<()> {
    let engine = connect(config)?;
    print_response(&engine.ping().await?)
}

pub async fn count(config: &Config) -> anyhow::Result<()> {
    let engine = connect(config)?;
    print_response(&engine.count().await?)
}

pub async fn list(config: &Config, args: ListArgs) -> anyhow::Result<()> {
    let engine = connect(config)?;
    print_response(&engine.list(args.offset, args.limit).await?)
}

pub async fn delete(config: &Config, args: DeleteArgs) -> anyhow::Result<()> {
    let engine = connect(config)?;
    print_response(&engine.delete(&args.filepaths).await?)
}

/// Execute the `add` command.
pub async fn add(config: &Config, args: AddArgs) -> anyhow::Result<()> {
    check_single_target(args.collection_filepath.as_deref(), args.files.len())?;
    let engine = connect(config)?;

    let mut images = Vec::with_capacity(args.files.len());
    for file in &args.files {
        images.push(
            read_image(
                file,
                args.collection_filepath.as_deref(),
                args.metadata.as_deref(),
            )
            .await?,
        );
    }
    tracing::info!("Adding {} image(s)", images.len());

    let response = match &engine {
        EngineClient::Match(client) => client.add_images(&images).await?,
        EngineClient::Mobile(client) => client.add_images(&images).await?,
        EngineClient::Wine(client) => client.add_images(&images).await?,
        EngineClient::Multicolor(client) => {
            MetadataQueryable::add_images(client, &images, !args.keep_background).await?
        }
    };
    print_response(&response)
}

/// Execute the `add-url` command.
pub async fn add_url(config: &Config, args: AddUrlArgs) -> anyhow::Result<()> {
    check_single_target(args.collection_filepath.as_deref(), args.urls.len())?;
    let engine = connect(config)?;

    let images = args
        .urls
        .iter()
        .map(|url| -> anyhow::Result<ImageDescriptor> {
            let mut builder = ImageDescriptor::builder().url(url);
            if let Some(filepath) = &args.collection_filepath {
                builder = builder.collection_filepath(filepath);
            }
            if let Some(metadata) = &args.metadata {
                builder = builder.metadata(checked_json(metadata)?);
            }
            Ok(builder.build()?)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    tracing::info!("Adding {} image URL(s)", images.len());

    let response = match &engine {
        EngineClient::Match(client) => client.add_urls(&images).await?,
        EngineClient::Mobile(client) => client.add_urls(&images).await?,
        EngineClient::Wine(client) => client.add_urls(&images).await?,
        EngineClient::Multicolor(client) => {
            MetadataQueryable::add_urls(client, &images, !args.keep_background).await?
        }
    };
    print_response(&response)
}

/// `--as` names one collection path, so it only makes sense for one image.
fn check_single_target(collection_filepath: Option<&str>, count: usize) -> anyhow::Result<()> {
    if collection_filepath.is_some() && count > 1 {
        anyhow::bail!(
            "--as can only be used when adding a single image ({count} given).\n  \
             Hint: add the images one at a time to give each its own collection path."
        );
    }
    Ok(())
}
