//! Faxgate Core: shared errors and gateway configuration.
//!
//! This crate has no internal faxgate dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: [`GatewayConfig`] loading from TOML files and environment

pub mod config;
pub mod error;

// Re-export key types at crate root for convenience
pub use config::{FaxApiConfig, GatewayConfig, HttpConfig, ServerConfig, SocketConfig, SseConfig};
pub use error::{Error, Result};
