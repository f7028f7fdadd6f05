//! Runtime client configuration, validated at construction.

use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;

/// Path segment every TinEye services API URL must end with.
pub const API_ROOT: &str = "/rest/";

/// How the client reports `warn` and `fail` responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Return every decoded response to the caller, whatever its status.
    #[default]
    Lenient,
    /// Raise [`TinEyeError::Warning`](crate::TinEyeError::Warning) on `warn`
    /// and [`TinEyeError::Service`](crate::TinEyeError::Service) on `fail`.
    Strict,
}

/// HTTP basic auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings shared by every engine client.
///
/// Read-only once built; clients clone it freely.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_url: String,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
    response_mode: ResponseMode,
}

impl ClientConfig {
    /// Create a configuration for the API rooted at `api_url`.
    ///
    /// The URL must use http(s) and end with `/rest/`, e.g.
    /// `http://localhost/rest/`. Anything else is rejected with a suggested
    /// correction.
    pub fn new(api_url: impl Into<String>) -> Result<Self, ConfigError> {
        let api_url = api_url.into();
        validate_api_url(&api_url)?;
        Ok(Self {
            api_url,
            credentials: None,
            timeout: None,
            response_mode: ResponseMode::default(),
        })
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Default timeout for every request. Unset means the HTTP client's default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = mode;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }

    /// Full URL for a wire method, e.g. `http://host/rest/search/`.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}{}/", self.api_url, method)
    }
}

fn validate_api_url(url: &str) -> Result<(), ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api_url must not be empty".into(),
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "api_url must start with http:// or https:// (got {url})"
        )));
    }
    if url.ends_with(API_ROOT) {
        return Ok(());
    }

    let trimmed = url.trim_end_matches('/');
    let suggestion = if trimmed.ends_with("/rest") {
        format!("{trimmed}/")
    } else {
        format!("{trimmed}{API_ROOT}")
    };
    Err(ConfigError::ApiUrl {
        url: url.to_string(),
        suggestion,
    })
}
