//! MulticolorEngine client: color and metadata driven search, color
//! extraction and color counting.
//!
//! Colors are strings in either `"R,G,B"` decimal or six-digit hex notation
//! (`"243,249,22"`, `"ffffff"`); they are passed through unvalidated.

use super::{MetadataQueryable, Searchable};
use crate::client::{Collection, ServiceClient};
use crate::config::ClientConfig;
use crate::error::{Result, TinEyeError};
use crate::image::ImageDescriptor;
use crate::params::{indexed_key, FilePart, Params, RequestOptions};
use crate::response::{ColorCount, ColorFormat, ExtractedColor, SearchMatch, ServiceResponse};
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const WEIGHTS_MISMATCH: &str = "Please specify the same number of weights as colors.";

/// Search parameters for `color_search`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSearchOptions {
    /// Ignore the background color of the query image
    pub ignore_background: bool,
    /// Also ignore background-colored regions enclosed by the foreground
    pub ignore_interior_background: bool,
    /// Metadata query restricting the searched images
    pub metadata: Option<String>,
    /// Metadata keys to return with each match
    pub return_metadata: Option<String>,
    /// Sort matches by the returned metadata
    pub sort_metadata: bool,
    pub min_score: f64,
    pub offset: u32,
    pub limit: u32,
}

impl Default for ColorSearchOptions {
    fn default() -> Self {
        Self {
            ignore_background: true,
            ignore_interior_background: true,
            metadata: None,
            return_metadata: None,
            sort_metadata: false,
            min_score: 0.0,
            offset: 0,
            limit: 5000,
        }
    }
}

impl ColorSearchOptions {
    /// Filtering and paging parameters, common to every color search.
    fn apply(&self, params: &mut Params) {
        params
            .insert_opt("metadata", self.metadata.as_deref())
            .insert_opt("return_metadata", self.return_metadata.as_deref())
            .insert("sort_metadata", self.sort_metadata)
            .insert("min_score", self.min_score)
            .insert("offset", self.offset)
            .insert("limit", self.limit);
    }

    /// Background handling, only meaningful when the query is an image.
    fn apply_background(&self, params: &mut Params) {
        params
            .insert("ignore_background", self.ignore_background)
            .insert("ignore_interior_background", self.ignore_interior_background);
    }
}

/// Parameters for color extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractColorsOptions {
    /// Image extraction only
    pub ignore_background: bool,
    /// Image extraction only
    pub ignore_interior_background: bool,
    /// Maximum number of colors returned
    pub limit: u32,
    pub color_format: ColorFormat,
}

impl Default for ExtractColorsOptions {
    fn default() -> Self {
        Self {
            ignore_background: true,
            ignore_interior_background: true,
            limit: 32,
            color_format: ColorFormat::Rgb,
        }
    }
}

impl ExtractColorsOptions {
    fn apply(&self, params: &mut Params) {
        params
            .insert("limit", self.limit)
            .insert("color_format", self.color_format);
    }

    fn apply_background(&self, params: &mut Params) {
        params
            .insert("ignore_background", self.ignore_background)
            .insert("ignore_interior_background", self.ignore_interior_background);
    }
}

/// Parameters for counting palette colors in images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountColorsOptions {
    pub ignore_background: bool,
    pub ignore_interior_background: bool,
}

impl Default for CountColorsOptions {
    fn default() -> Self {
        Self {
            ignore_background: true,
            ignore_interior_background: true,
        }
    }
}

impl CountColorsOptions {
    fn apply(&self, params: &mut Params) {
        params
            .insert("ignore_background", self.ignore_background)
            .insert("ignore_interior_background", self.ignore_interior_background);
    }
}

/// Which part of the collection a collection-wide color operation covers.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CollectionFilter {
    /// Every image in the collection
    #[default]
    All,
    /// The listed collection filepaths
    Filepaths(Vec<String>),
    /// Images matching a metadata query
    Metadata(String),
    /// Images matching a palette; `weights` may be empty
    Colors {
        colors: Vec<String>,
        weights: Vec<String>,
    },
}

impl CollectionFilter {
    pub fn filepaths<S: AsRef<str>>(filepaths: &[S]) -> Self {
        CollectionFilter::Filepaths(filepaths.iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn metadata(query: impl Into<String>) -> Self {
        CollectionFilter::Metadata(query.into())
    }

    pub fn colors<S: AsRef<str>>(colors: &[S]) -> Self {
        CollectionFilter::Colors {
            colors: colors.iter().map(|s| s.as_ref().to_string()).collect(),
            weights: Vec::new(),
        }
    }

    pub fn weighted_colors<S: AsRef<str>, W: AsRef<str>>(colors: &[S], weights: &[W]) -> Self {
        CollectionFilter::Colors {
            colors: colors.iter().map(|s| s.as_ref().to_string()).collect(),
            weights: weights.iter().map(|w| w.as_ref().to_string()).collect(),
        }
    }

    fn apply(&self, params: &mut Params) -> Result<()> {
        match self {
            CollectionFilter::All => {}
            CollectionFilter::Filepaths(filepaths) => {
                params.insert_indexed_str("filepaths", filepaths);
            }
            CollectionFilter::Metadata(query) => {
                params.insert("metadata", query);
            }
            CollectionFilter::Colors { colors, weights } => {
                check_weights(colors.len(), weights.len())?;
                params
                    .insert_indexed_str("colors", colors)
                    .insert_indexed_str("weights", weights);
            }
        }
        Ok(())
    }
}

fn check_weights(colors: usize, weights: usize) -> Result<()> {
    if weights != 0 && weights != colors {
        return Err(TinEyeError::InvalidArgument(WEIGHTS_MISMATCH.to_string()));
    }
    Ok(())
}

/// Color search, extraction and counting.
#[async_trait]
pub trait ColorQueryable: Collection {
    /// Search for images containing `colors`.
    ///
    /// `weights`, when not empty, must pair one-to-one with `colors`;
    /// otherwise nothing is sent and the call fails with
    /// [`TinEyeError::InvalidArgument`].
    async fn search_colors<S, W>(
        &self,
        colors: &[S],
        weights: &[W],
        options: &ColorSearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>>
    where
        S: AsRef<str> + Sync,
        W: AsRef<str> + Sync,
    {
        check_weights(colors.len(), weights.len())?;
        let mut params = Params::new();
        params
            .insert_indexed_str("colors", colors)
            .insert_indexed_str("weights", weights);
        options.apply(&mut params);
        self.service().request("color_search", params, Vec::new()).await
    }

    /// Search by metadata alone. `metadata` replaces any query in `options`.
    async fn search_metadata(
        &self,
        metadata: &str,
        return_metadata: Option<&str>,
        options: &ColorSearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let options = ColorSearchOptions {
            metadata: Some(metadata.to_string()),
            return_metadata: return_metadata
                .map(str::to_string)
                .or_else(|| options.return_metadata.clone()),
            ..options.clone()
        };
        let mut params = Params::new();
        options.apply(&mut params);
        self.service().request("color_search", params, Vec::new()).await
    }

    /// Dominant colors of uploaded images.
    async fn extract_image_colors_image(
        &self,
        images: &[ImageDescriptor],
        options: &ExtractColorsOptions,
    ) -> Result<ServiceResponse<Vec<ExtractedColor>>> {
        let files = image_parts(images)?;
        let mut params = Params::new();
        options.apply(&mut params);
        options.apply_background(&mut params);
        self.service()
            .request("extract_image_colors", params, files)
            .await
    }

    /// Dominant colors of images the service downloads.
    async fn extract_image_colors_url<S>(
        &self,
        urls: &[S],
        options: &ExtractColorsOptions,
    ) -> Result<ServiceResponse<Vec<ExtractedColor>>>
    where
        S: AsRef<str> + Sync,
    {
        let mut params = Params::new();
        params.insert_indexed_str("urls", urls);
        options.apply(&mut params);
        options.apply_background(&mut params);
        self.service()
            .request("extract_image_colors", params, Vec::new())
            .await
    }

    /// Dominant colors of (part of) the collection.
    async fn extract_collection_colors(
        &self,
        filter: &CollectionFilter,
        options: &ExtractColorsOptions,
    ) -> Result<ServiceResponse<Vec<ExtractedColor>>> {
        let mut params = Params::new();
        filter.apply(&mut params)?;
        options.apply(&mut params);
        self.service()
            .request("extract_collection_colors", params, Vec::new())
            .await
    }

    /// How many of the uploaded images contain each of `count_colors`.
    async fn count_image_colors_image<S>(
        &self,
        images: &[ImageDescriptor],
        count_colors: &[S],
        options: &CountColorsOptions,
    ) -> Result<ServiceResponse<Vec<ColorCount>>>
    where
        S: AsRef<str> + Sync,
    {
        let files = image_parts(images)?;
        let mut params = Params::new();
        params.insert_indexed_str("count_colors", count_colors);
        options.apply(&mut params);
        self.service()
            .request("count_image_colors", params, files)
            .await
    }

    /// How many of the downloaded images contain each of `count_colors`.
    async fn count_image_colors_url<S, C>(
        &self,
        urls: &[S],
        count_colors: &[C],
        options: &CountColorsOptions,
    ) -> Result<ServiceResponse<Vec<ColorCount>>>
    where
        S: AsRef<str> + Sync,
        C: AsRef<str> + Sync,
    {
        let mut params = Params::new();
        params
            .insert_indexed_str("urls", urls)
            .insert_indexed_str("count_colors", count_colors);
        options.apply(&mut params);
        self.service()
            .request("count_image_colors", params, Vec::new())
            .await
    }

    /// How many collection images contain each of `count_colors`.
    async fn count_collection_colors<S>(
        &self,
        filter: &CollectionFilter,
        count_colors: &[S],
    ) -> Result<ServiceResponse<Vec<ColorCount>>>
    where
        S: AsRef<str> + Sync,
    {
        let mut params = Params::new();
        filter.apply(&mut params)?;
        params.insert_indexed_str("count_colors", count_colors);
        self.service()
            .request("count_collection_colors", params, Vec::new())
            .await
    }

    /// How many collection images match each metadata query.
    async fn count_metadata<S>(
        &self,
        count_metadata: &[S],
        filter: &CollectionFilter,
    ) -> Result<ServiceResponse<Value>>
    where
        S: AsRef<str> + Sync,
    {
        let mut params = Params::new();
        filter.apply(&mut params)?;
        params.insert_indexed_str("count_metadata", count_metadata);
        self.service()
            .request("count_metadata", params, Vec::new())
            .await
    }
}

/// `images[i]` attachments named after each image's collection filepath.
fn image_parts(images: &[ImageDescriptor]) -> Result<Vec<FilePart>> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            Ok(FilePart::new(
                indexed_key("images", i),
                image.collection_filepath(),
                image.require_data()?,
            ))
        })
        .collect()
}

/// Client for a MulticolorEngine service.
#[derive(Debug, Clone)]
pub struct MulticolorEngineClient {
    service: ServiceClient,
}

impl MulticolorEngineClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::from_service(ServiceClient::new(config))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self::from_service(ServiceClient::with_transport(config, transport))
    }

    pub fn from_service(service: ServiceClient) -> Self {
        Self { service }
    }

    pub fn with_request_options(&self, options: RequestOptions) -> Self {
        Self::from_service(self.service.with_request_options(options))
    }
}

impl Collection for MulticolorEngineClient {
    fn service(&self) -> &ServiceClient {
        &self.service
    }
}

impl MetadataQueryable for MulticolorEngineClient {}

impl ColorQueryable for MulticolorEngineClient {}

#[async_trait]
impl Searchable for MulticolorEngineClient {
    type Options = ColorSearchOptions;

    async fn search_image(
        &self,
        image: &ImageDescriptor,
        options: &ColorSearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let files = vec![FilePart::new(
            "image",
            image.collection_filepath(),
            image.require_data()?,
        )];
        let mut params = Params::new();
        options.apply_background(&mut params);
        options.apply(&mut params);
        self.service.request("color_search", params, files).await
    }

    async fn search_filepath(
        &self,
        filepath: &str,
        options: &ColorSearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let mut params = Params::new();
        params.insert("filepath", filepath);
        options.apply_background(&mut params);
        options.apply(&mut params);
        self.service.request("color_search", params, Vec::new()).await
    }

    async fn search_url(
        &self,
        url: &str,
        options: &ColorSearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let mut params = Params::new();
        params.insert("url", url);
        options.apply_background(&mut params);
        options.apply(&mut params);
        self.service.request("color_search", params, Vec::new()).await
    }
}
