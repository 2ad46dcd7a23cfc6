//! Error types for faxgate-core

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for faxgate-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in faxgate-core
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error tied to a specific path
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Wraps an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::config("bad port");
        assert_eq!(err.to_string(), "Configuration error: bad port");
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = Error::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            "/etc/faxgate.toml",
        );
        let msg = err.to_string();
        assert!(msg.contains("/etc/faxgate.toml"));
        assert!(msg.contains("missing"));
    }
}
