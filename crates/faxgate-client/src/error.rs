//! Error types for faxgate-client

use thiserror::Error;

/// Result type alias for faxgate-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the fax API
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Fax API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// `detail` from the error body, or the canonical reason
        message: String,
    },

    /// The API answered with something we could not interpret
    #[error("Invalid response from Fax API: {0}")]
    InvalidResponse(String),

    /// A URL could not be built or parsed
    #[error("Invalid URL: {0}")]
    Url(String),

    /// A downloaded body went past the configured size limit
    #[error("document exceeds the {limit}-byte limit")]
    TooLarge {
        /// Limit in bytes
        limit: usize,
    },
}

impl Error {
    /// HTTP status code, when the failure came from an upstream response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable detail without the status prefix.
    pub fn detail(&self) -> String {
        match self {
            Error::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
