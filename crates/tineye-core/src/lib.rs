//! TinEye Core - client library for the TinEye services APIs.
//!
//! The TinEye services (MatchEngine, MobileEngine, WineEngine and
//! MulticolorEngine) are HTTP APIs over an image collection you own. This
//! crate turns high-level operations into the services' flat `name[i]`
//! parameter protocol and decodes the JSON envelope they answer with.
//!
//! # Architecture
//!
//! ```text
//! ImageDescriptor ─┐
//!                  ├─> engine client ─> Params ─> ServiceClient::request ─> Transport (reqwest)
//! options ─────────┘                                   │
//!                                                      └─< ServiceResponse<T> (ok | warn | fail)
//! ```
//!
//! Engines share one [`ServiceClient`] and expose their operations through
//! small capability traits: [`Collection`], [`Searchable`],
//! [`MetadataQueryable`] and [`ColorQueryable`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use tineye_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> tineye_core::Result<()> {
//!     let config = ClientConfig::new("http://localhost/rest/")?;
//!     let engine = MatchEngineClient::new(config);
//!
//!     let image = ImageDescriptor::builder()
//!         .path("banana.jpg")
//!         .collection_filepath("folder/banana.jpg")
//!         .build()?;
//!     engine.add_images(&[image]).await?;
//!
//!     let hits = engine
//!         .search_url("https://tineye.com/images/meloncat.jpg", &SearchOptions::default())
//!         .await?;
//!     for hit in hits.result {
//!         println!("{} {}", hit.score, hit.filepath);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod client;
pub mod config;
pub mod engines;
pub mod error;
pub mod image;
pub mod params;
pub mod response;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use client::{Collection, ServiceClient, DEFAULT_LIST_LIMIT};
pub use config::{ClientConfig, Config, Credentials, ResponseMode};
pub use engines::{
    CollectionFilter, ColorQueryable, ColorSearchOptions, CompareOptions, CountColorsOptions,
    EngineClient, EngineType, ExtractColorsOptions, MatchEngineClient, MetadataQueryable,
    MobileEngineClient, MulticolorEngineClient, SearchOptions, Searchable, WineEngineClient,
};
pub use error::{ConfigError, Result, TinEyeError};
pub use image::{ImageBuilder, ImageDescriptor};
pub use params::RequestOptions;
pub use response::{
    Color, ColorCount, ColorFormat, CompareMatch, ExtractedColor, SearchMatch, ServiceResponse,
    Status,
};
pub use transport::{ReqwestTransport, Transport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to call the engines, traits included.
pub mod prelude {
    pub use crate::client::Collection;
    pub use crate::config::{ClientConfig, ResponseMode};
    pub use crate::engines::{
        CollectionFilter, ColorQueryable, ColorSearchOptions, CompareOptions, CountColorsOptions,
        EngineClient, EngineType, ExtractColorsOptions, MatchEngineClient, MetadataQueryable,
        MobileEngineClient, MulticolorEngineClient, SearchOptions, Searchable, WineEngineClient,
    };
    pub use crate::image::ImageDescriptor;
    pub use crate::params::RequestOptions;
    pub use crate::response::{ColorFormat, ServiceResponse, Status};
}
