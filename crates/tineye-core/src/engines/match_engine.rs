//! MatchEngine client, also used for MobileEngine and WineEngine.
//!
//! All three engines share one wire protocol, so the client is generic over a
//! zero-sized [`MatchVariant`] marker that only names the engine:
//!
//! ```rust,ignore
//! let config = ClientConfig::new("http://localhost/rest/")?;
//! let engine = MatchEngineClient::new(config.clone());
//! let mobile = MobileEngineClient::new(config);
//!
//! let image = ImageDescriptor::from_path("banana.jpg")?;
//! engine.add_images(&[image.clone()]).await?;
//! let hits = engine.search_image(&image, &SearchOptions::default()).await?;
//! ```

use super::Searchable;
use crate::client::{Collection, ServiceClient};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::image::ImageDescriptor;
use crate::params::{indexed_key, FilePart, Params, RequestOptions};
use crate::response::{CompareMatch, SearchMatch, ServiceResponse};
use crate::transport::Transport;
use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Names a service that speaks the MatchEngine protocol.
pub trait MatchVariant: Send + Sync + 'static {
    /// Product name, used in logs and `Debug` output
    const NAME: &'static str;
}

/// Marker types for [`MatchEngineClient`].
pub mod variant {
    use super::MatchVariant;

    /// Exact and near-duplicate matching.
    #[derive(Debug, Clone, Copy)]
    pub enum Match {}

    /// Matching tuned for photos taken with phone cameras.
    #[derive(Debug, Clone, Copy)]
    pub enum Mobile {}

    /// Wine label recognition.
    #[derive(Debug, Clone, Copy)]
    pub enum Wine {}

    impl MatchVariant for Match {
        const NAME: &'static str = "MatchEngine";
    }

    impl MatchVariant for Mobile {
        const NAME: &'static str = "MobileEngine";
    }

    impl MatchVariant for Wine {
        const NAME: &'static str = "WineEngine";
    }
}

/// Search parameters for the match engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Minimum score of returned matches
    pub min_score: f64,
    /// Offset of results from the start
    pub offset: u32,
    /// Maximum number of matches returned
    pub limit: u32,
    /// Also look for horizontally flipped copies
    pub check_horizontal_flip: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            offset: 0,
            limit: 10,
            check_horizontal_flip: false,
        }
    }
}

impl SearchOptions {
    fn apply(&self, params: &mut Params) {
        params
            .insert("min_score", self.min_score)
            .insert("offset", self.offset)
            .insert("limit", self.limit)
            .insert("check_horizontal_flip", self.check_horizontal_flip);
    }
}

/// Parameters for pairwise comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompareOptions {
    pub min_score: f64,
    pub check_horizontal_flip: bool,
}

impl CompareOptions {
    fn apply(&self, params: &mut Params) {
        params
            .insert("min_score", self.min_score)
            .insert("check_horizontal_flip", self.check_horizontal_flip);
    }
}

/// Client for a MatchEngine-protocol service.
pub struct MatchEngineClient<V: MatchVariant = variant::Match> {
    service: ServiceClient,
    _variant: PhantomData<V>,
}

/// MobileEngine: the MatchEngine protocol under its own name.
pub type MobileEngineClient = MatchEngineClient<variant::Mobile>;

/// WineEngine: the MatchEngine protocol under its own name.
pub type WineEngineClient = MatchEngineClient<variant::Wine>;

impl<V: MatchVariant> MatchEngineClient<V> {
    pub fn new(config: ClientConfig) -> Self {
        Self::from_service(ServiceClient::new(config))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self::from_service(ServiceClient::with_transport(config, transport))
    }

    pub fn from_service(service: ServiceClient) -> Self {
        Self {
            service,
            _variant: PhantomData,
        }
    }

    /// A clone whose calls use `options`.
    pub fn with_request_options(&self, options: RequestOptions) -> Self {
        Self::from_service(self.service.with_request_options(options))
    }

    /// Add images by uploading their data.
    ///
    /// Every image must carry data. The uploads get placeholder file names
    /// and the collection filepaths travel as `filepaths[i]`.
    pub async fn add_images(&self, images: &[ImageDescriptor]) -> Result<ServiceResponse> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let mut params = Params::new();
        let mut files = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            files.push(FilePart::new(
                indexed_key("images", i),
                format!("{stamp}.{i}"),
                image.require_data()?,
            ));
            params.insert(indexed_key("filepaths", i), image.collection_filepath());
        }

        tracing::debug!(engine = V::NAME, count = images.len(), "Adding images by upload");
        self.service.request("add", params, files).await
    }

    /// Add images the service downloads from their URLs.
    pub async fn add_urls(&self, images: &[ImageDescriptor]) -> Result<ServiceResponse> {
        let mut params = Params::new();
        for (i, image) in images.iter().enumerate() {
            params
                .insert(indexed_key("urls", i), image.require_url()?)
                .insert(indexed_key("filepaths", i), image.collection_filepath());
        }

        tracing::debug!(engine = V::NAME, count = images.len(), "Adding images by URL");
        self.service.request("add", params, Vec::new()).await
    }

    /// Compare two uploaded images.
    ///
    /// `result` is empty when they do not match above `min_score`.
    pub async fn compare_images(
        &self,
        first: &ImageDescriptor,
        second: &ImageDescriptor,
        options: &CompareOptions,
    ) -> Result<ServiceResponse<Vec<CompareMatch>>> {
        let files = vec![
            FilePart::new("image1", first.collection_filepath(), first.require_data()?),
            FilePart::new("image2", second.collection_filepath(), second.require_data()?),
        ];
        let mut params = Params::new();
        options.apply(&mut params);
        self.service.request("compare", params, files).await
    }

    /// Compare two images the service downloads.
    pub async fn compare_urls(
        &self,
        first: &str,
        second: &str,
        options: &CompareOptions,
    ) -> Result<ServiceResponse<Vec<CompareMatch>>> {
        let mut params = Params::new();
        params.insert("url1", first).insert("url2", second);
        options.apply(&mut params);
        self.service.request("compare", params, Vec::new()).await
    }
}

impl<V: MatchVariant> Clone for MatchEngineClient<V> {
    fn clone(&self) -> Self {
        Self::from_service(self.service.clone())
    }
}

impl<V: MatchVariant> fmt::Debug for MatchEngineClient<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(V::NAME)
            .field("service", &self.service)
            .finish()
    }
}

impl<V: MatchVariant> Collection for MatchEngineClient<V> {
    fn service(&self) -> &ServiceClient {
        &self.service
    }
}

#[async_trait]
impl<V: MatchVariant> Searchable for MatchEngineClient<V> {
    type Options = SearchOptions;

    async fn search_image(
        &self,
        image: &ImageDescriptor,
        options: &SearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let files = vec![FilePart::new(
            "image",
            image.collection_filepath(),
            image.require_data()?,
        )];
        let mut params = Params::new();
        options.apply(&mut params);
        self.service.request("search", params, files).await
    }

    async fn search_filepath(
        &self,
        filepath: &str,
        options: &SearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let mut params = Params::new();
        params.insert("filepath", filepath);
        options.apply(&mut params);
        self.service.request("search", params, Vec::new()).await
    }

    async fn search_url(
        &self,
        url: &str,
        options: &SearchOptions,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>> {
        let mut params = Params::new();
        params.insert("url", url);
        options.apply(&mut params);
        self.service.request("search", params, Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_LIST_LIMIT;
    use crate::error::TinEyeError;
    use crate::testing::{FakeCollection, MockTransport};
    use crate::transport::HttpMethod;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost/rest/").unwrap()
    }

    fn image(filepath: &str, data: &[u8]) -> ImageDescriptor {
        ImageDescriptor::builder()
            .data(data.to_vec())
            .collection_filepath(filepath)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_images_uses_placeholder_names_and_filepaths() {
        let transport = MockTransport::new();
        let engine = MatchEngineClient::<variant::Match>::with_transport(config(), transport.clone());

        engine
            .add_images(&[image("folder/banana.jpg", b"one"), image("banana_flip.jpg", b"two")])
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.url, "http://localhost/rest/add/");
        assert_eq!(request.http_method(), HttpMethod::Post);
        assert_eq!(request.params.get("filepaths[0]"), Some("folder/banana.jpg"));
        assert_eq!(request.params.get("filepaths[1]"), Some("banana_flip.jpg"));
        assert_eq!(request.files[0].field, "images[0]");
        assert!(request.files[0].file_name.ends_with(".0"));
        assert_eq!(request.files[1].field, "images[1]");
        assert_eq!(request.files[1].data, b"two");
    }

    #[tokio::test]
    async fn test_add_images_rejects_url_only_image_before_sending() {
        let transport = MockTransport::new();
        let engine = MatchEngineClient::<variant::Match>::with_transport(config(), transport.clone());
        let remote = ImageDescriptor::from_url("https://tineye.com/images/meloncat.jpg").unwrap();

        let err = engine.add_images(&[remote]).await.unwrap_err();
        assert!(matches!(err, TinEyeError::ArgumentType(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_add_urls() {
        let transport = MockTransport::new();
        let engine = WineEngineClient::with_transport(config(), transport.clone());
        let remote = ImageDescriptor::from_url("https://tineye.com/images/meloncat.jpg").unwrap();

        engine.add_urls(&[remote]).await.unwrap();
        let request = transport.last_request();
        assert_eq!(request.http_method(), HttpMethod::Get);
        assert_eq!(
            request.params.get("urls[0]"),
            Some("https://tineye.com/images/meloncat.jpg")
        );
        assert_eq!(request.params.get("filepaths[0]"), Some("meloncat.jpg"));
    }

    #[tokio::test]
    async fn test_search_parameters() {
        let transport = MockTransport::new();
        let engine = MobileEngineClient::with_transport(config(), transport.clone());

        engine
            .search_filepath("banana.jpg", &SearchOptions::default())
            .await
            .unwrap();
        let request = transport.last_request();
        assert_eq!(request.url, "http://localhost/rest/search/");
        assert_eq!(request.params.get("filepath"), Some("banana.jpg"));
        assert_eq!(request.params.get("min_score"), Some("0"));
        assert_eq!(request.params.get("offset"), Some("0"));
        assert_eq!(request.params.get("limit"), Some("10"));
        assert_eq!(request.params.get("check_horizontal_flip"), Some("false"));

        let options = SearchOptions {
            min_score: 50.5,
            limit: 3,
            check_horizontal_flip: true,
            ..Default::default()
        };
        engine
            .search_image(&image("query.jpg", b"bytes"), &options)
            .await
            .unwrap();
        let request = transport.last_request();
        assert_eq!(request.files[0].field, "image");
        assert_eq!(request.files[0].file_name, "query.jpg");
        assert_eq!(request.params.get("min_score"), Some("50.5"));
        assert_eq!(request.params.get("limit"), Some("3"));
        assert_eq!(request.params.get("check_horizontal_flip"), Some("true"));
    }

    #[tokio::test]
    async fn test_compare() {
        let transport = MockTransport::new();
        transport.reply_json(json!({
            "status": "ok", "method": "compare", "error": [],
            "result": [{"score": "98.40", "match_percent": "90.1"}]
        }));
        let engine = MatchEngineClient::<variant::Match>::with_transport(config(), transport.clone());

        let response = engine
            .compare_images(
                &image("a.jpg", b"a"),
                &image("b.jpg", b"b"),
                &CompareOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(response.result[0].score, 98.4);
        let request = transport.last_request();
        assert_eq!(request.url, "http://localhost/rest/compare/");
        assert_eq!(request.files[0].field, "image1");
        assert_eq!(request.files[1].field, "image2");

        // No match: empty result.
        let response = engine
            .compare_urls("https://host/a.jpg", "https://host/b.jpg", &CompareOptions::default())
            .await
            .unwrap();
        assert!(response.result.is_empty());
        let request = transport.last_request();
        assert_eq!(request.params.get("url1"), Some("https://host/a.jpg"));
        assert_eq!(request.params.get("url2"), Some("https://host/b.jpg"));
        assert_eq!(request.params.get("limit"), None);
    }

    #[tokio::test]
    async fn test_add_list_delete_round_trip() {
        let engine = MatchEngineClient::<variant::Match>::with_transport(config(), FakeCollection::new());

        let added = engine
            .add_images(&[image("folder/banana.jpg", b"banana"), image("banana_flip.jpg", b"flip")])
            .await
            .unwrap();
        assert!(added.is_ok());
        assert_eq!(engine.count().await.unwrap().result, vec![2]);

        let listed = engine.list(0, DEFAULT_LIST_LIMIT).await.unwrap();
        assert_eq!(listed.result, vec!["folder/banana.jpg", "banana_flip.jpg"]);

        let deleted = engine.delete(&["folder/banana.jpg"]).await.unwrap();
        assert!(deleted.is_ok());
        let listed = engine.list(0, DEFAULT_LIST_LIMIT).await.unwrap();
        assert_eq!(listed.result, vec!["banana_flip.jpg"]);
        assert_eq!(engine.count().await.unwrap().result, vec![1]);

        let missing = engine.delete(&["folder/banana.jpg"]).await.unwrap();
        assert!(missing.is_warn());
        assert_eq!(missing.error, vec!["folder/banana.jpg: Failed to remove from index."]);
    }

    #[tokio::test]
    async fn test_search_with_identical_image_scores_high() {
        let engine = MatchEngineClient::<variant::Match>::with_transport(config(), FakeCollection::new());
        let banana = image("banana.jpg", b"banana-bytes");
        engine
            .add_images(&[banana.clone(), image("other.jpg", b"other")])
            .await
            .unwrap();

        let hits = engine
            .search_image(&banana, &SearchOptions::default())
            .await
            .unwrap();
        assert!(hits.is_ok());
        assert!(!hits.result.is_empty());
        assert!(hits.result.iter().all(|hit| hit.score > 90.0));
        assert_eq!(hits.result[0].filepath, "banana.jpg");

        let by_path = engine
            .search_filepath("banana.jpg", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(by_path.result.len(), 1);
    }

    #[tokio::test]
    async fn test_search_unreachable_url() {
        let engine = MatchEngineClient::<variant::Match>::with_transport(config(), FakeCollection::new());
        let url = "https://tineye.com/404";

        let response = engine.search_url(url, &SearchOptions::default()).await.unwrap();
        assert!(response.is_fail());
        assert_eq!(response.error, vec![format!("{url}: Failed to download file.")]);
        assert!(response.result.is_empty());

        match response.into_result() {
            Err(TinEyeError::Service(messages)) => {
                assert_eq!(messages, vec!["https://tineye.com/404: Failed to download file."])
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_options_reach_transport() {
        let transport = MockTransport::new();
        let engine = MobileEngineClient::with_transport(config(), transport.clone());
        engine
            .with_request_options(RequestOptions::with_timeout(std::time::Duration::from_millis(250)))
            .ping()
            .await
            .unwrap();
        assert_eq!(
            transport.last_request().timeout,
            Some(std::time::Duration::from_millis(250))
        );
    }

    #[test]
    fn test_variants_are_named() {
        let engine = WineEngineClient::new(config());
        assert!(format!("{engine:?}").starts_with("WineEngine"));
        assert_eq!(<variant::Mobile as MatchVariant>::NAME, "MobileEngine");
    }
}
