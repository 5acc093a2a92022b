//! Error types for Hearth client operations

use thiserror::Error;

/// Result type alias for Hearth client operations
pub type Result<T> = std::result::Result<T, HearthError>;

/// Errors that can occur while setting up Hearth client operations.
///
/// Everything after a watch's read loop starts is reported asynchronously
/// (see [`crate::streaming::StreamError`]); these are the synchronous
/// failures.
#[derive(Error, Debug)]
pub enum HearthError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server rejected the streaming request
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
}
