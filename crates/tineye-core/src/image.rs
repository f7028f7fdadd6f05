//! Image descriptors: what gets uploaded to, or referenced by, a collection.
//!
//! An image is either raw bytes (usually read from a local file) or a URL
//! the service downloads itself, plus the collection filepath it is stored
//! under and optional metadata.
//!
//! ```rust,ignore
//! use tineye_core::ImageDescriptor;
//!
//! let local = ImageDescriptor::builder()
//!     .path("/path/to/image.jpg")
//!     .collection_filepath("collection.jpg")
//!     .build()?;
//!
//! let remote = ImageDescriptor::from_url("https://tineye.com/images/meloncat.jpg")?;
//! assert_eq!(remote.collection_filepath(), "meloncat.jpg");
//! ```

use crate::error::{Result, TinEyeError};
use std::fmt;
use std::path::{Path, PathBuf};

/// One image to submit to a TinEye engine. Immutable once built.
#[derive(Clone, PartialEq)]
pub struct ImageDescriptor {
    data: Option<Vec<u8>>,
    source_path: Option<PathBuf>,
    url: Option<String>,
    collection_filepath: String,
    metadata: Option<String>,
}

impl ImageDescriptor {
    pub fn builder() -> ImageBuilder {
        ImageBuilder::default()
    }

    /// Read an image from disk; the path doubles as the collection filepath.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).build()
    }

    /// Reference a remote image; the collection filepath is the URL's last segment.
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::builder().url(url).build()
    }

    /// Raw image bytes, if the image was read or supplied locally.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// The local file the data was read from.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Key under which the image is stored in the remote collection.
    pub fn collection_filepath(&self) -> &str {
        &self.collection_filepath
    }

    /// Serialized metadata, passed through to the service untouched.
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Image bytes for upload calls.
    pub(crate) fn require_data(&self) -> Result<&[u8]> {
        self.data().ok_or_else(|| {
            TinEyeError::ArgumentType(format!(
                "Image {} has no data; upload calls need images read from a file or raw bytes.",
                self.describe()
            ))
        })
    }

    /// Image URL for URL-based calls.
    pub(crate) fn require_url(&self) -> Result<&str> {
        self.url().ok_or_else(|| {
            TinEyeError::ArgumentType(format!(
                "Image {} has no URL; URL calls need images built with a URL.",
                self.describe()
            ))
        })
    }

    fn describe(&self) -> &str {
        if self.collection_filepath.is_empty() {
            "<unnamed>"
        } else {
            &self.collection_filepath
        }
    }
}

impl fmt::Debug for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDescriptor")
            .field("data", &self.data.as_ref().map(|d| format!("{} bytes", d.len())))
            .field("source_path", &self.source_path)
            .field("url", &self.url)
            .field("collection_filepath", &self.collection_filepath)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Builder for [`ImageDescriptor`].
#[derive(Debug, Default, Clone)]
pub struct ImageBuilder {
    path: Option<PathBuf>,
    data: Option<Vec<u8>>,
    url: Option<String>,
    collection_filepath: Option<String>,
    metadata: Option<String>,
}

impl ImageBuilder {
    /// Read image data from this local file (`~` is expanded).
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        self.path = Some(PathBuf::from(shellexpand::tilde(&raw).into_owned()));
        self
    }

    /// Use in-memory image data. Without a URL it needs an explicit collection filepath.
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Store the image under this key instead of the derived one.
    pub fn collection_filepath(mut self, filepath: impl Into<String>) -> Self {
        self.collection_filepath = Some(filepath.into());
        self
    }

    /// Attach already-serialized metadata.
    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Attach metadata as JSON.
    pub fn metadata_json(self, metadata: &serde_json::Value) -> Self {
        self.metadata(metadata.to_string())
    }

    /// Build the descriptor, reading the file synchronously if a path was given.
    pub fn build(mut self) -> Result<ImageDescriptor> {
        let data = match (&self.path, self.data.take()) {
            (Some(path), None) => Some(std::fs::read(path).map_err(|source| TinEyeError::Io {
                path: path.clone(),
                source,
            })?),
            (None, data) => data,
            (Some(_), Some(_)) => return Err(both_sources()),
        };
        self.finish(data)
    }

    /// Build the descriptor, reading the file on the tokio runtime.
    pub async fn build_async(mut self) -> Result<ImageDescriptor> {
        let data = match (&self.path, self.data.take()) {
            (Some(path), None) => {
                Some(
                    tokio::fs::read(path)
                        .await
                        .map_err(|source| TinEyeError::Io {
                            path: path.clone(),
                            source,
                        })?,
                )
            }
            (None, data) => data,
            (Some(_), Some(_)) => return Err(both_sources()),
        };
        self.finish(data)
    }

    fn finish(self, data: Option<Vec<u8>>) -> Result<ImageDescriptor> {
        let url = self.url.filter(|u| !u.is_empty());
        if data.is_none() && url.is_none() {
            return Err(TinEyeError::ArgumentType(
                "Image needs either data or a URL.".to_string(),
            ));
        }

        // Explicit filepath wins, then the local path, then the URL basename.
        let explicit = self.collection_filepath.filter(|f| !f.is_empty());
        let collection_filepath = match (explicit, &self.path, &url) {
            (Some(explicit), _, _) => explicit,
            (None, Some(path), _) => path.to_string_lossy().into_owned(),
            (None, None, Some(url)) => url_basename(url).to_string(),
            (None, None, _) => {
                return Err(TinEyeError::ArgumentType(
                    "Image data without a source file needs a collection filepath.".to_string(),
                ))
            }
        };

        Ok(ImageDescriptor {
            data,
            source_path: self.path,
            url,
            collection_filepath,
            metadata: self.metadata,
        })
    }
}

fn both_sources() -> TinEyeError {
    TinEyeError::ArgumentType("Image needs either a file path or raw data, not both.".to_string())
}

/// Last path segment of a URL, ignoring any query string or fragment.
fn url_basename(url: &str) -> &str {
    let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path)
}
