//! Engine clients.
//!
//! Every engine embeds a [`ServiceClient`] and implements the capability
//! traits for the operations its API offers:
//!
//! | Engine                  | Collection | Searchable | MetadataQueryable | ColorQueryable |
//! |-------------------------|:----------:|:----------:|:-----------------:|:--------------:|
//! | [`MatchEngineClient`]   | yes        | yes        |                   |                |
//! | [`MobileEngineClient`]  | yes        | yes        |                   |                |
//! | [`WineEngineClient`]    | yes        | yes        |                   |                |
//! | [`MulticolorEngineClient`] | yes     | yes        | yes               | yes            |
//!
//! Mobile and wine engines speak the MatchEngine protocol unchanged, so they
//! are the same client with a different type parameter.

pub(crate) mod match_engine;
pub(crate) mod metadata;
pub(crate) mod multicolor;

pub use match_engine::{
    variant, CompareOptions, MatchEngineClient, MatchVariant, MobileEngineClient, SearchOptions,
    WineEngineClient,
};
pub use metadata::MetadataQueryable;
pub use multicolor::{
    CollectionFilter, ColorQueryable, ColorSearchOptions, CountColorsOptions,
    ExtractColorsOptions, MulticolorEngineClient,
};

use crate::client::{Collection, ServiceClient};
use crate::config::ClientConfig;
use crate::error::{ConfigError, Result};
use crate::image::ImageDescriptor;
use crate::response::{SearchMatch, ServiceResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Searching the collection by image, stored filepath or URL.
///
/// Each engine has its own search knobs, exposed as [`Searchable::Options`].
#[async_trait]
pub trait Searchable: Collection {
    type Options: Default + Send + Sync;

    /// Search with uploaded image data. The image must carry data.
    async fn search_image(
        &self,
        image: &ImageDescriptor,
        options: &Self::Options,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>>;

    /// Search with an image already in the collection.
    async fn search_filepath(
        &self,
        filepath: &str,
        options: &Self::Options,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>>;

    /// Search with an image the service downloads.
    ///
    /// An unreachable URL fails with `"<url>: Failed to download file."`.
    async fn search_url(
        &self,
        url: &str,
        options: &Self::Options,
    ) -> Result<ServiceResponse<Vec<SearchMatch>>>;
}

/// The TinEye services engine types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    #[default]
    MatchEngine,
    MobileEngine,
    WineEngine,
    MulticolorEngine,
}

impl EngineType {
    pub const ALL: [EngineType; 4] = [
        EngineType::MatchEngine,
        EngineType::MobileEngine,
        EngineType::WineEngine,
        EngineType::MulticolorEngine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::MatchEngine => "matchengine",
            EngineType::MobileEngine => "mobileengine",
            EngineType::WineEngine => "wineengine",
            EngineType::MulticolorEngine => "multicolorengine",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineType {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        EngineType::ALL
            .into_iter()
            .find(|engine| engine.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownEngine(s.to_string()))
    }
}

/// A client for whichever engine the configuration names.
#[derive(Debug, Clone)]
pub enum EngineClient {
    Match(MatchEngineClient),
    Mobile(MobileEngineClient),
    Wine(WineEngineClient),
    Multicolor(MulticolorEngineClient),
}

impl EngineClient {
    /// Create a client for `engine` over HTTP.
    pub fn new(engine: EngineType, config: ClientConfig) -> Self {
        Self::from_service(engine, ServiceClient::new(config))
    }

    pub fn from_service(engine: EngineType, service: ServiceClient) -> Self {
        tracing::debug!(%engine, api_url = service.config().api_url(), "Creating engine client");
        match engine {
            EngineType::MatchEngine => EngineClient::Match(MatchEngineClient::from_service(service)),
            EngineType::MobileEngine => {
                EngineClient::Mobile(MobileEngineClient::from_service(service))
            }
            EngineType::WineEngine => EngineClient::Wine(WineEngineClient::from_service(service)),
            EngineType::MulticolorEngine => {
                EngineClient::Multicolor(MulticolorEngineClient::from_service(service))
            }
        }
    }

    pub fn engine_type(&self) -> EngineType {
        match self {
            EngineClient::Match(_) => EngineType::MatchEngine,
            EngineClient::Mobile(_) => EngineType::MobileEngine,
            EngineClient::Wine(_) => EngineType::WineEngine,
            EngineClient::Multicolor(_) => EngineType::MulticolorEngine,
        }
    }

    /// The multicolor client, if this is a multicolor engine.
    pub fn as_multicolor(&self) -> Option<&MulticolorEngineClient> {
        match self {
            EngineClient::Multicolor(client) => Some(client),
            _ => None,
        }
    }
}

impl Collection for EngineClient {
    fn service(&self) -> &ServiceClient {
        match self {
            EngineClient::Match(client) => client.service(),
            EngineClient::Mobile(client) => client.service(),
            EngineClient::Wine(client) => client.service(),
            EngineClient::Multicolor(client) => client.service(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    #[test]
    fn test_engine_type_parsing() {
        assert_eq!("matchengine".parse::<EngineType>().unwrap(), EngineType::MatchEngine);
        assert_eq!("MobileEngine".parse::<EngineType>().unwrap(), EngineType::MobileEngine);
        assert_eq!("wine-engine".parse::<EngineType>().unwrap(), EngineType::WineEngine);
        assert_eq!(
            "multicolor_engine".parse::<EngineType>().unwrap(),
            EngineType::MulticolorEngine
        );
        assert!(matches!(
            "pixelengine".parse::<EngineType>(),
            Err(ConfigError::UnknownEngine(_))
        ));
    }

    #[test]
    fn test_engine_type_round_trips_display() {
        for engine in EngineType::ALL {
            assert_eq!(engine.to_string().parse::<EngineType>().unwrap(), engine);
        }
    }

    #[tokio::test]
    async fn test_engine_client_dispatch() {
        let transport = MockTransport::new();
        let service = ServiceClient::with_transport(
            ClientConfig::new("http://localhost/rest/").unwrap(),
            transport.clone(),
        );

        for engine in EngineType::ALL {
            let client = EngineClient::from_service(engine, service.clone());
            assert_eq!(client.engine_type(), engine);
            assert_eq!(
                client.as_multicolor().is_some(),
                engine == EngineType::MulticolorEngine
            );
            client.ping().await.unwrap();
        }
        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://localhost/rest/ping/"; 4]);
    }
}
