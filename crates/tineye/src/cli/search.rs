//! The `search` and `compare` commands.

use super::{connect, print_response, read_image};
use clap::{ArgGroup, Args};
use std::path::PathBuf;
use tineye_core::{
    ColorSearchOptions, CompareOptions, Config, EngineClient, SearchMatch, SearchOptions,
    Searchable, ServiceResponse,
};

/// Arguments for the `search` command.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("query").required(true).args(["image", "url", "filepath"])))]
pub struct SearchArgs {
    /// Search with a local image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Search with an image URL the service downloads
    #[arg(long)]
    pub url: Option<String>,

    /// Search with an image already in the collection
    #[arg(long)]
    pub filepath: Option<String>,

    /// Minimum score of returned matches
    #[arg(long, default_value_t = 0.0)]
    pub min_score: f64,

    /// Skip this many matches
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Maximum number of matches (engine default when unset)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Also match horizontally flipped copies (match engines only)
    #[arg(long)]
    pub check_horizontal_flip: bool,

    /// Metadata query restricting the search (multicolorengine only)
    #[arg(long)]
    pub metadata: Option<String>,

    /// Metadata keys to return with each match (multicolorengine only)
    #[arg(long)]
    pub return_metadata: Option<String>,

    /// Sort matches by returned metadata (multicolorengine only)
    #[arg(long)]
    pub sort_metadata: bool,

    /// Keep the query image background (multicolorengine only)
    #[arg(long)]
    pub keep_background: bool,
}

impl SearchArgs {
    fn match_options(&self) -> SearchOptions {
        let defaults = SearchOptions::default();
        SearchOptions {
            min_score: self.min_score,
            offset: self.offset,
            limit: self.limit.unwrap_or(defaults.limit),
            check_horizontal_flip: self.check_horizontal_flip,
        }
    }

    fn color_options(&self) -> ColorSearchOptions {
        let defaults = ColorSearchOptions::default();
        ColorSearchOptions {
            ignore_background: !self.keep_background,
            ignore_interior_background: !self.keep_background,
            metadata: self.metadata.clone(),
            return_metadata: self.return_metadata.clone(),
            sort_metadata: self.sort_metadata,
            min_score: self.min_score,
            offset: self.offset,
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Arguments for the `compare` command.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("pair").required(true).args(["files", "urls"])))]
pub struct CompareArgs {
    /// Two local image files
    #[arg(num_args = 2, value_names = ["FIRST", "SECOND"])]
    pub files: Vec<PathBuf>,

    /// Two image URLs instead of files
    #[arg(long, num_args = 2, value_names = ["FIRST_URL", "SECOND_URL"])]
    pub urls: Vec<String>,

    /// Minimum score to report a match
    #[arg(long, default_value_t = 0.0)]
    pub min_score: f64,

    /// Also match a horizontally flipped copy
    #[arg(long)]
    pub check_horizontal_flip: bool,
}

/// What to search with.
enum Query {
    Image(tineye_core::ImageDescriptor),
    Url(String),
    Filepath(String),
}

async fn run_search<E: Searchable>(
    engine: &E,
    query: &Query,
    options: &E::Options,
) -> tineye_core::Result<ServiceResponse<Vec<SearchMatch>>> {
    match query {
        Query::Image(image) => engine.search_image(image, options).await,
        Query::Url(url) => engine.search_url(url, options).await,
        Query::Filepath(filepath) => engine.search_filepath(filepath, options).await,
    }
}

/// Execute the `search` command.
pub async fn search(config: &Config, args: SearchArgs) -> anyhow::Result<()> {
    let engine = connect(config)?;

    let query = match (&args.image, &args.url, &args.filepath) {
        (Some(path), _, _) => Query::Image(read_image(path, None, None).await?),
        (None, Some(url), _) => Query::Url(url.clone()),
        (None, None, Some(filepath)) => Query::Filepath(filepath.clone()),
        (None, None, None) => anyhow::bail!("Specify one of --image, --url or --filepath."),
    };

    let response = match &engine {
        EngineClient::Match(client) => run_search(client, &query, &args.match_options()).await?,
        EngineClient::Mobile(client) => run_search(client, &query, &args.match_options()).await?,
        EngineClient::Wine(client) => run_search(client, &query, &args.match_options()).await?,
        EngineClient::Multicolor(client) => {
            run_search(client, &query, &args.color_options()).await?
        }
    };
    tracing::info!("{} match(es)", response.result.len());
    print_response(&response)
}

/// Execute the `compare` command.
pub async fn compare(config: &Config, args: CompareArgs) -> anyhow::Result<()> {
    let engine = connect(config)?;
    let options = CompareOptions {
        min_score: args.min_score,
        check_horizontal_flip: args.check_horizontal_flip,
    };

    let response = if let [first, second] = args.urls.as_slice() {
        match &engine {
            EngineClient::Match(client) => client.compare_urls(first, second, &options).await?,
            EngineClient::Mobile(client) => client.compare_urls(first, second, &options).await?,
            EngineClient::Wine(client) => client.compare_urls(first, second, &options).await?,
            EngineClient::Multicolor(_) => anyhow::bail!(unsupported_compare()),
        }
    } else if let [first, second] = args.files.as_slice() {
        let first = read_image(first, None, None).await?;
        let second = read_image(second, None, None).await?;
        match &engine {
            EngineClient::Match(client) => client.compare_images(&first, &second, &options).await?,
            EngineClient::Mobile(client) => {
                client.compare_images(&first, &second, &options).await?
            }
            EngineClient::Wine(client) => client.compare_images(&first, &second, &options).await?,
            EngineClient::Multicolor(_) => anyhow::bail!(unsupported_compare()),
        }
    } else {
        anyhow::bail!("Specify two image files or --urls with two URLs.");
    };
    print_response(&response)
}

fn unsupported_compare() -> String {
    "`compare` is not available on multicolorengine; use `colors` instead.".to_string()
}
