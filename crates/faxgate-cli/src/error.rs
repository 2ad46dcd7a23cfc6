//! Error types for faxgate-cli

use thiserror::Error;

/// Result type alias for faxgate-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling and running the gateway
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from faxgate-core
    #[error("Core error: {0}")]
    Core(#[from] faxgate_core::Error),

    /// Error from faxgate-client
    #[error("Client error: {0}")]
    Client(#[from] faxgate_client::Error),

    /// Error from faxgate-mcp
    #[error("MCP error: {0}")]
    Mcp(#[from] faxgate_mcp::Error),

    /// Error from faxgate-server
    #[error("Server error: {0}")]
    Server(#[from] faxgate_server::Error),
}
