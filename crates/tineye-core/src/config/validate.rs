//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    ///
    /// The API URL itself is checked when the client config is built, so a
    /// config file with a mistyped URL still loads and can be shown or fixed.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.service.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service.api_url must not be empty".into(),
            ));
        }
        if self.service.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "service.timeout_ms must be > 0".into(),
            ));
        }
        if self.service.password.is_some() && self.service.username.is_none() {
            return Err(ConfigError::ValidationError(
                "service.password is set but service.username is not".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
