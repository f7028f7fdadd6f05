//! Error types for the TinEye services client.
//!
//! Errors are split by where they originate: caller-side argument problems
//! are raised before any request is sent, configuration problems at client
//! construction, and the rest come back from the remote service (HTTP-level
//! or protocol-level).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for TinEye service operations.
#[derive(Error, Debug)]
pub enum TinEyeError {
    /// An argument has the wrong shape for the operation, e.g. an image
    /// without data passed to an upload call.
    #[error("{0}")]
    ArgumentType(String),

    /// An argument is well-shaped but violates an operation rule.
    #[error("{0}")]
    InvalidArgument(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    /// The request never produced an HTTP response (DNS, refused, timeout).
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The service answered `warn`; raised only in strict mode.
    #[error("Service warning: {}", .0.join("; "))]
    Warning(Vec<String>),

    /// The service answered `fail`; raised only in strict mode.
    #[error("Service error: {}", .0.join("; "))]
    Service(Vec<String>),

    /// The response body is not a valid service response.
    #[error("Failed to decode response of {method}: {message}")]
    Decode { method: String, message: String },

    /// Failed to read a local image
    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TinEyeError {
    /// Human-readable messages carried by this error.
    ///
    /// Service warnings and errors return the server's `error` array verbatim;
    /// every other variant returns a single message.
    pub fn messages(&self) -> Vec<String> {
        match self {
            TinEyeError::Warning(messages) | TinEyeError::Service(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Whether this error was raised locally, before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            TinEyeError::ArgumentType(_)
                | TinEyeError::InvalidArgument(_)
                | TinEyeError::Config(_)
                | TinEyeError::Io { .. }
        )
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The API URL does not point at the service's REST root
    #[error("API URL {url} must end with /rest/; did you mean {suggestion}?")]
    ApiUrl { url: String, suggestion: String },

    /// Unknown engine name in config or on the command line
    #[error("Unknown engine: {0} (expected matchengine, mobileengine, wineengine or multicolorengine)")]
    UnknownEngine(String),
}

/// Convenience type alias for TinEye results.
pub type Result<T> = std::result::Result<T, TinEyeError>;
