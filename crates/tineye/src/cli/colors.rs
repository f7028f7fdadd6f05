//! The `tineye colors` command (multicolorengine only).

use super::{connect, print_response, read_images, require_multicolor};
use clap::{ArgGroup, Args, Subcommand, ValueEnum};
use std::path::PathBuf;
use tineye_core::{
    CollectionFilter, ColorFormat, ColorQueryable, ColorSearchOptions, Config, CountColorsOptions,
    ExtractColorsOptions,
};

/// Arguments for the `colors` command.
#[derive(Args, Debug)]
pub struct ColorsArgs {
    #[command(subcommand)]
    pub command: ColorsCommand,
}

/// Color subcommands.
#[derive(Subcommand, Debug)]
pub enum ColorsCommand {
    /// Search the collection by color palette
    Search {
        /// Colors as "R,G,B" or hex, e.g. "243,249,22" or "ffffff"
        #[arg(required = true)]
        colors: Vec<String>,

        /// One weight per color
        #[arg(long, num_args = 1..)]
        weights: Vec<String>,

        /// Metadata query restricting the search
        #[arg(long)]
        metadata: Option<String>,

        /// Metadata keys to return with each match
        #[arg(long)]
        return_metadata: Option<String>,

        /// Sort matches by returned metadata
        #[arg(long)]
        sort_metadata: bool,

        /// Minimum score of returned matches
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        #[arg(long, default_value_t = 5000)]
        limit: u32,
    },

    /// Extract dominant colors from images or the collection
    Extract {
        #[command(flatten)]
        source: ColorSource,

        /// Maximum number of colors
        #[arg(long, default_value_t = 32)]
        limit: u32,

        /// Color notation of the result
        #[arg(long, value_enum, default_value_t = Format::Rgb)]
        format: Format,

        /// Keep image backgrounds
        #[arg(long)]
        keep_background: bool,
    },

    /// Count images containing each of a palette's colors
    Count {
        /// Palette colors to count
        #[arg(long = "count-colors", required = true, num_args = 1..)]
        count_colors: Vec<String>,

        #[command(flatten)]
        source: ColorSource,

        /// Keep image backgrounds
        #[arg(long)]
        keep_background: bool,
    },
}

/// Which images a color operation looks at. Nothing selected means the whole collection.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").multiple(false).args(["images", "urls", "filepaths", "collection_metadata", "collection_colors"])))]
pub struct ColorSource {
    /// Local image files
    #[arg(long = "image", num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Image URLs
    #[arg(long = "url", num_args = 1..)]
    pub urls: Vec<String>,

    /// Collection paths
    #[arg(long = "filepath", num_args = 1..)]
    pub filepaths: Vec<String>,

    /// Collection images matching a metadata query
    #[arg(long = "where-metadata")]
    pub collection_metadata: Option<String>,

    /// Collection images matching these colors
    #[arg(long = "where-colors", num_args = 1..)]
    pub collection_colors: Vec<String>,
}

impl ColorSource {
    /// The collection filter, or `None` when images or URLs were given.
    fn collection_filter(&self) -> Option<CollectionFilter> {
        if !self.images.is_empty() || !self.urls.is_empty() {
            return None;
        }
        Some(if !self.filepaths.is_empty() {
            CollectionFilter::filepaths(&self.filepaths)
        } else if let Some(query) = &self.collection_metadata {
            CollectionFilter::metadata(query.clone())
        } else if !self.collection_colors.is_empty() {
            CollectionFilter::colors(&self.collection_colors)
        } else {
            CollectionFilter::All
        })
    }
}

/// Color notation flag.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    /// [r, g, b] triples
    Rgb,
    /// Six hex digits
    Hex,
}

impl From<Format> for ColorFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Rgb => ColorFormat::Rgb,
            Format::Hex => ColorFormat::Hex,
        }
    }
}

/// Execute the colors command.
pub async fn execute(config: &Config, args: ColorsArgs) -> anyhow::Result<()> {
    let engine = connect(config)?;
    let client = require_multicolor(&engine, "colors")?;

    match args.command {
        ColorsCommand::Search {
            colors,
            weights,
            metadata,
            return_metadata,
            sort_metadata,
            min_score,
            offset,
            limit,
        } => {
            let options = ColorSearchOptions {
                metadata,
                return_metadata,
                sort_metadata,
                min_score,
                offset,
                limit,
                ..Default::default()
            };
            print_response(&client.search_colors(&colors, &weights, &options).await?)
        }

        ColorsCommand::Extract {
            source,
            limit,
            format,
            keep_background,
        } => {
            let options = ExtractColorsOptions {
                ignore_background: !keep_background,
                ignore_interior_background: !keep_background,
                limit,
                color_format: format.into(),
            };
            let response = match source.collection_filter() {
                Some(filter) => client.extract_collection_colors(&filter, &options).await?,
                None if !source.images.is_empty() => {
                    let images = read_images(&source.images).await?;
                    client.extract_image_colors_image(&images, &options).await?
                }
                None => client.extract_image_colors_url(&source.urls, &options).await?,
            };
            print_response(&response)
        }

        ColorsCommand::Count {
            count_colors,
            source,
            keep_background,
        } => {
            let options = CountColorsOptions {
                ignore_background: !keep_background,
                ignore_interior_background: !keep_background,
            };
            let response = match source.collection_filter() {
                Some(filter) => client.count_collection_colors(&filter, &count_colors).await?,
                None if !source.images.is_empty() => {
                    let images = read_images(&source.images).await?;
                    client
                        .count_image_colors_image(&images, &count_colors, &options)
                        .await?
                }
                None => {
                    client
                        .count_image_colors_url(&source.urls, &count_colors, &options)
                        .await?
                }
            };
            print_response(&response)
        }
    }
}
