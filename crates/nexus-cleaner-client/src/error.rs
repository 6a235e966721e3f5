//! Error types for Nexus client operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to Nexus or loading its configuration.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to connect to Nexus.
    #[error("Failed to connect to Nexus at {url}: {source}")]
    ConnectionFailed {
        /// Nexus URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Nexus rejected the credentials.
    #[error("Authentication failed ({status}): {message}")]
    AuthenticationFailed {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Error message.
        message: String,
    },

    /// The requested resource does not exist (e.g., already deleted).
    #[error("Not found: {resource}")]
    NotFound {
        /// Resource path.
        resource: String,
    },

    /// HTTP error from Nexus.
    #[error("HTTP error from Nexus: {status} - {message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Unable to parse response from {url}: {source}")]
    InvalidResponse {
        /// Request URL.
        url: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Nexus handed out a continuation token it had already returned.
    #[error("Pagination of {repository} did not advance: continuation token {token} returned twice")]
    PaginationLoop {
        /// Repository being listed.
        repository: String,
        /// Repeated token.
        token: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// Configuration file does not exist.
    #[error("Config file not found ({path})")]
    ConfigNotFound {
        /// Config file path.
        path: PathBuf,
    },

    /// Configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A required configuration key is missing or empty.
    #[error("{key} not specified in {path}")]
    MissingConfigKey {
        /// Missing key.
        key: String,
        /// Config file path (or source description).
        path: String,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else {
            Self::HttpError {
                status: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}
