//! Configuration management for the TinEye client.
//!
//! Two layers: [`ClientConfig`] is what a client is built from and is
//! validated on construction; [`Config`] is the optional TOML file the CLI
//! reads (platform config dir, `tineye/config.toml`) and converts into a
//! `ClientConfig`.

mod client;
mod types;
mod validate;

pub use client::{ClientConfig, Credentials, ResponseMode, API_ROOT};
pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service connection settings
    pub service: ServiceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tineye.tineye/config.toml
    /// - Linux: ~/.config/tineye/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tineye\config\config.toml
    ///
    /// Falls back to ~/.tineye/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tineye", "tineye")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tineye").join("config.toml")
            })
    }

    /// Build a validated client configuration from the `[service]` section.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let service = &self.service;
        let mut client = ClientConfig::new(service.api_url.clone())?;

        if let Some(username) = &service.username {
            let password = service
                .password
                .as_deref()
                .and_then(resolve_env_var)
                .unwrap_or_default();
            client = client.with_credentials(username, &password);
        }
        if let Some(ms) = service.timeout_ms {
            client = client.with_timeout(Duration::from_millis(ms));
        }
        if service.strict {
            client = client.with_response_mode(ResponseMode::Strict);
        }
        Ok(client)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
