//! Error types for faxgate-mcp

use thiserror::Error;

/// Result type alias for faxgate-mcp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Startup-time errors raised while assembling registries.
///
/// Request-time failures are protocol errors ([`crate::model::ErrorData`]).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Two tools resolved to the same qualified name
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// A plugin manifest is unusable
    #[error("Invalid plugin '{id}': {reason}")]
    InvalidPlugin {
        /// Plugin id from the manifest
        id: String,
        /// What is wrong with it
        reason: String,
    },
}

impl Error {
    /// Creates an invalid-plugin error.
    pub fn invalid_plugin(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPlugin {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
