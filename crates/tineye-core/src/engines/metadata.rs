//! Operations of engines that store metadata alongside images.

use crate::client::Collection;
use crate::error::Result;
use crate::image::ImageDescriptor;
use crate::params::{indexed_key, FilePart, Params};
use crate::response::ServiceResponse;
use async_trait::async_trait;
use serde_json::Value;

/// Adding images with metadata, updating it, and introspecting what the
/// collection's metadata looks like.
///
/// Every method has a default implementation on top of
/// [`Collection::service`]; implementors only opt in.
#[async_trait]
pub trait MetadataQueryable: Collection {
    /// Add images by uploading their data, with any metadata they carry.
    ///
    /// The upload file name is the collection filepath. `metadata[i]` is
    /// only sent for images that have metadata, keeping `i` aligned with
    /// `images[i]`.
    async fn add_images(
        &self,
        images: &[ImageDescriptor],
        ignore_background: bool,
    ) -> Result<ServiceResponse> {
        let mut params = Params::new();
        params.insert("ignore_background", ignore_background);
        let mut files = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            files.push(FilePart::new(
                indexed_key("images", i),
                image.collection_filepath(),
                image.require_data()?,
            ));
            params.insert_opt(&indexed_key("metadata", i), image.metadata());
        }
        self.service().request("add", params, files).await
    }

    /// Add images the service downloads, with any metadata they carry.
    async fn add_urls(
        &self,
        images: &[ImageDescriptor],
        ignore_background: bool,
    ) -> Result<ServiceResponse> {
        let mut params = Params::new();
        params.insert("ignore_background", ignore_background);
        for (i, image) in images.iter().enumerate() {
            params
                .insert(indexed_key("urls", i), image.require_url()?)
                .insert(indexed_key("filepaths", i), image.collection_filepath())
                .insert_opt(&indexed_key("metadata", i), image.metadata());
        }
        self.service().request("add", params, Vec::new()).await
    }

    /// Replace the metadata of images already in the collection.
    ///
    /// `filepaths[i]` gets `metadata[i]`; the two slices are paired by
    /// position and should have the same length.
    async fn update_metadata<S, M>(&self, filepaths: &[S], metadata: &[M]) -> Result<ServiceResponse>
    where
        S: AsRef<str> + Sync,
        M: AsRef<str> + Sync,
    {
        if filepaths.len() != metadata.len() {
            tracing::warn!(
                filepaths = filepaths.len(),
                metadata = metadata.len(),
                "update_metadata called with unpaired filepaths and metadata"
            );
        }
        let mut params = Params::new();
        params
            .insert_indexed_str("filepaths", filepaths)
            .insert_indexed_str("metadata", metadata);
        self.service().request("update_metadata", params, Vec::new()).await
    }

    /// Stored metadata tree of each filepath.
    async fn get_metadata<S>(&self, filepaths: &[S]) -> Result<ServiceResponse<Value>>
    where
        S: AsRef<str> + Sync,
    {
        let mut params = Params::new();
        params.insert_indexed_str("filepaths", filepaths);
        self.service().request("get_metadata", params, Vec::new()).await
    }

    /// Metadata keys that can be searched, with their types and image counts.
    ///
    /// A collection without metadata answers `warn`.
    async fn get_search_metadata(&self) -> Result<ServiceResponse<Value>> {
        self.service()
            .request("get_search_metadata", Params::new(), Vec::new())
            .await
    }

    /// Metadata keys a search can return with each match.
    async fn get_return_metadata(&self) -> Result<ServiceResponse<Value>> {
        self.service()
            .request("get_return_metadata", Params::new(), Vec::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::engines::MulticolorEngineClient;
    use crate::error::TinEyeError;
    use crate::testing::MockTransport;
    use crate::transport::HttpMethod;
    use serde_json::json;

    fn engine(transport: std::sync::Arc<MockTransport>) -> MulticolorEngineClient {
        MulticolorEngineClient::with_transport(
            ClientConfig::new("http://localhost/rest/").unwrap(),
            transport,
        )
    }

    #[tokio::test]
    async fn test_add_images_keeps_metadata_aligned() {
        let transport = MockTransport::new();
        let images = vec![
            ImageDescriptor::builder()
                .data(b"plain".to_vec())
                .collection_filepath("plain.jpg")
                .build()
                .unwrap(),
            ImageDescriptor::builder()
                .data(b"tagged".to_vec())
                .collection_filepath("folder/tagged.jpg")
                .metadata_json(&json!({"keywords": ["dolphin"]}))
                .build()
                .unwrap(),
        ];

        engine(transport.clone()).add_images(&images, true).await.unwrap();

        let request = transport.last_request();
        assert_eq!(request.http_method(), HttpMethod::Post);
        assert_eq!(request.params.get("ignore_background"), Some("true"));
        assert_eq!(request.params.get("metadata[0]"), None);
        assert_eq!(
            request.params.get("metadata[1]"),
            Some(r#"{"keywords":["dolphin"]}"#)
        );
        assert_eq!(request.files[1].field, "images[1]");
        assert_eq!(request.files[1].file_name, "folder/tagged.jpg");
        assert_eq!(request.params.get("filepaths[0]"), None);
    }

    #[tokio::test]
    async fn test_add_urls_with_metadata() {
        let transport = MockTransport::new();
        let image = ImageDescriptor::builder()
            .url("https://tineye.com/images/meloncat.jpg")
            .metadata(r#"{"id": "12345"}"#)
            .build()
            .unwrap();

        engine(transport.clone()).add_urls(&[image], false).await.unwrap();

        let request = transport.last_request();
        assert_eq!(request.http_method(), HttpMethod::Get);
        assert_eq!(request.params.get("ignore_background"), Some("false"));
        assert_eq!(request.params.get("filepaths[0]"), Some("meloncat.jpg"));
        assert_eq!(request.params.get("metadata[0]"), Some(r#"{"id": "12345"}"#));
    }

    #[tokio::test]
    async fn test_add_urls_requires_urls() {
        let transport = MockTransport::new();
        let local = ImageDescriptor::builder()
            .data(vec![1])
            .collection_filepath("local.jpg")
            .build()
            .unwrap();
        let err = engine(transport.clone()).add_urls(&[local], true).await.unwrap_err();
        assert!(matches!(err, TinEyeError::ArgumentType(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_metadata_pairs_by_position() {
        let transport = MockTransport::new();
        engine(transport.clone())
            .update_metadata(&["a.jpg", "b.jpg"], &[r#"{"n": 1}"#, r#"{"n": 2}"#])
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.url, "http://localhost/rest/update_metadata/");
        assert_eq!(request.params.get("filepaths[1]"), Some("b.jpg"));
        assert_eq!(request.params.get("metadata[1]"), Some(r#"{"n": 2}"#));
    }

    #[tokio::test]
    async fn test_update_metadata_mismatch_is_sent_anyway() {
        let transport = MockTransport::new();
        engine(transport.clone())
            .update_metadata(&["a.jpg", "b.jpg"], &[r#"{"n": 1}"#])
            .await
            .unwrap();
        assert_eq!(transport.last_request().params.len(), 3);
    }

    #[tokio::test]
    async fn test_get_metadata_and_schemas() {
        let transport = MockTransport::new();
        transport.reply_json(json!({
            "status": "ok", "method": "get_metadata", "error": [],
            "result": [{"a.jpg": {"keywords": ["dolphin"]}}]
        }));
        transport.reply_json(json!({
            "status": "warn", "method": "get_search_metadata",
            "error": ["Failed to get the search metadata from index."], "result": {}
        }));
        let engine = engine(transport.clone());

        let metadata = engine.get_metadata(&["a.jpg"]).await.unwrap();
        assert_eq!(metadata.result[0]["a.jpg"]["keywords"][0], "dolphin");
        assert_eq!(transport.last_request().params.get("filepaths[0]"), Some("a.jpg"));

        let schema = engine.get_search_metadata().await.unwrap();
        assert!(schema.is_warn());
        assert_eq!(schema.error, vec!["Failed to get the search metadata from index."]);

        engine.get_return_metadata().await.unwrap();
        let request = transport.last_request();
        assert_eq!(request.url, "http://localhost/rest/get_return_metadata/");
        assert!(request.params.is_empty());
    }
}
