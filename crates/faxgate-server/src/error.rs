//! Error types for faxgate-server.

use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias for faxgate-server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop a transport.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O failure while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid listen address.
    #[error("Invalid listen address {0}")]
    Address(String),
}
