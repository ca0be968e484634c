use std::path::PathBuf;
use thiserror::Error;

use crate::persistence::PersistenceError;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the spotlight-archiver library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network or transport failure talking to the delivery API or image host
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Malformed API payload
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Image decoding error while fingerprinting
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Record store failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// File not found error
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Locale code that is not `xx-XX` shaped
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A retried operation was never attempted
    #[error("Operation failed after retries, but no attempt was made")]
    NoAttempts,
}

impl Error {
    /// Whether retrying the whole per-locale operation could succeed.
    ///
    /// Upstream failures are transient. Store, configuration and input
    /// errors are terminal and surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::HttpStatus { .. } | Error::Parse(_) | Error::Image(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_are_retryable() {
        let err = Error::HttpStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        assert!(err.is_retryable());

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::from(parse).is_retryable());
    }

    #[test]
    fn local_errors_are_terminal() {
        assert!(!Error::InvalidLocale("xx".to_string()).is_retryable());
        assert!(!Error::NoAttempts.is_retryable());
        assert!(!Error::Configuration("bad".to_string()).is_retryable());
        assert!(!Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")).is_retryable());
    }
}
