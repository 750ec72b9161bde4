//! Error types for fetch operations

use thiserror::Error;

/// Errors raised while fetching a source into its destination
#[derive(Debug, Error)]
pub enum FetchError {
    // ============ Network ============
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timeout")]
    Timeout,

    // ============ Authentication ============
    #[error("authentication required for {url}")]
    Auth { url: String },

    // ============ Decompression ============
    #[error("failed to unpack archive: {message}")]
    Decompression { message: String },

    #[error("archive entry escapes the destination: {path}")]
    UnsafeEntryPath { path: String },

    // ============ Filesystem ============
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("invalid destination directory: {path}")]
    InvalidDestination { path: String },
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            FetchError::Network {
                message: e.to_string(),
            }
        }
    }
}
