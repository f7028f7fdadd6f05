//! Config file sections with their defaults.

use crate::engines::EngineType;
use serde::{Deserialize, Serialize};

/// Service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API root, must end with `/rest/`
    pub api_url: String,

    /// Which engine the API serves
    pub engine: EngineType,

    /// Basic auth username
    pub username: Option<String>,

    /// Basic auth password (supports ${ENV_VAR} syntax)
    pub password: Option<String>,

    /// Request timeout in milliseconds; unset uses the HTTP client default
    pub timeout_ms: Option<u64>,

    /// Raise errors on `warn`/`fail` responses instead of returning them
    pub strict: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost/rest/".to_string(),
            engine: EngineType::default(),
            username: None,
            password: None,
            timeout_ms: None,
            strict: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
