//! Command implementations and the pieces they share.

pub mod collection;
pub mod colors;
pub mod config;
pub mod metadata;
pub mod search;

use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tineye_core::{Config, ConfigError, EngineClient, EngineType, ImageDescriptor, ServiceResponse};

/// Connection flags, available on every command. They override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// API root URL, e.g. https://matchengine.tineye.com/<account>/rest/
    #[arg(long, global = true, env = "TINEYE_API_URL")]
    pub api_url: Option<String>,

    /// Engine served at the API URL
    #[arg(long, global = true, env = "TINEYE_ENGINE")]
    pub engine: Option<EngineType>,

    /// Basic auth username
    #[arg(long, global = true, env = "TINEYE_USERNAME")]
    pub username: Option<String>,

    /// Basic auth password
    #[arg(long, global = true, env = "TINEYE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Fail on `warn` and `fail` responses
    #[arg(long, global = true)]
    pub strict: bool,
}

impl ConnectionArgs {
    /// Layer the flags over the loaded config.
    pub fn apply(&self, config: &mut Config) {
        let service = &mut config.service;
        if let Some(api_url) = &self.api_url {
            service.api_url = api_url.clone();
        }
        if let Some(engine) = self.engine {
            service.engine = engine;
        }
        if let Some(username) = &self.username {
            service.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            service.password = Some(password.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            service.timeout_ms = Some(timeout_ms);
        }
        if self.strict {
            service.strict = true;
        }
    }
}

/// The loaded config, or the defaults when the file could not be loaded.
///
/// Logging isn't initialized yet when this runs, so the warning goes through
/// eprintln.
pub fn config_or_default(loaded: Result<Config, ConfigError>) -> Config {
    loaded.unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config: {e}\n  \
             Using default configuration. Check your config file with `tineye config path`."
        );
        Config::default()
    })
}

/// Build the engine client from a config the flags were already applied to.
pub fn connect(config: &Config) -> anyhow::Result<EngineClient> {
    let client_config = config.client_config()?;
    tracing::debug!(
        engine = %config.service.engine,
        api_url = client_config.api_url(),
        "Connecting"
    );
    Ok(EngineClient::new(config.service.engine, client_config))
}

/// Print a decoded response as pretty JSON on stdout.
pub fn print_response<T: Serialize>(response: &ServiceResponse<T>) -> anyhow::Result<()> {
    if !response.is_ok() {
        tracing::warn!(
            "{} returned {:?}: {}",
            response.method,
            response.status,
            response.error.join("; ")
        );
    }
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

/// Read a local image, optionally storing it under another collection path.
pub async fn read_image(
    path: &Path,
    collection_filepath: Option<&str>,
    metadata: Option<&str>,
) -> anyhow::Result<ImageDescriptor> {
    let mut builder = ImageDescriptor::builder().path(path);
    if let Some(filepath) = collection_filepath {
        builder = builder.collection_filepath(filepath);
    }
    if let Some(metadata) = metadata {
        builder = builder.metadata(checked_json(metadata)?);
    }
    Ok(builder.build_async().await?)
}

/// Read several local images, keeping their paths as collection paths.
pub async fn read_images(paths: &[PathBuf]) -> anyhow::Result<Vec<ImageDescriptor>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(read_image(path, None, None).await?);
    }
    Ok(images)
}

/// Reject metadata that is not JSON before it reaches the service.
pub fn checked_json(raw: &str) -> anyhow::Result<&str> {
    serde_json::from_str::<serde_json::Value>(raw)
        .map_err(|e| anyhow::anyhow!("Metadata is not valid JSON: {e}"))?;
    Ok(raw)
}

/// Require a multicolor engine for commands only it supports.
pub fn require_multicolor<'a>(
    engine: &'a EngineClient,
    command: &str,
) -> anyhow::Result<&'a tineye_core::MulticolorEngineClient> {
    engine.as_multicolor().ok_or_else(|| {
        anyhow::anyhow!(
            "`{command}` needs a multicolorengine API, but the configured engine is {}.\n  \
             Hint: pass --engine multicolorengine or set `engine` in the config file.",
            engine.engine_type()
        )
    })
}
