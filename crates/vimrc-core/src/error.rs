//! Error types for core operations.

use thiserror::Error;

/// Errors raised by remote access and configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A remote answered with a non-success status.
    #[error("GET {url} failed: {status}")]
    Fetch { url: String, status: u16 },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The URL does not follow the hosting provider's layout.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A setting could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Http(e.to_string())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
