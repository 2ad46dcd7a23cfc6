//! MCP dispatch core for faxgate.
//!
//! Every transport hands decoded JSON-RPC messages to an [`McpCore`], which
//! resolves them against a shared [`ToolRegistry`] and optional
//! [`ResourceRegistry`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      faxgate-mcp                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  model - rmcp payload types plus gateway constructors       │
//! │  jsonrpc - request/response framing and parse errors        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolRegistry trait - tool listing and dispatch             │
//! │  CompositeRegistry - combine registries, reject duplicates  │
//! │  PluginRegistry - `<pluginId>_<tool>` plugin adapter        │
//! │  ResourceRegistry trait - URI dereferencing                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  McpServer - shared registry + server identity              │
//! │  McpCore - one per session, serialized; rmcp ServerHandler  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use faxgate_mcp::{CompositeRegistry, McpServer, PluginRegistry};
//!
//! let mut plugins = PluginRegistry::new();
//! plugins.register(StatusPlugin::new(api.clone()))?;
//!
//! let registry = CompositeRegistry::new().add(fax_tools)?.add(plugins)?;
//! let server = McpServer::new(registry).with_name("faxgate-mcp");
//!
//! let core = server.core();
//! let response = core.handle(request).await;
//! ```

pub mod error;
pub mod jsonrpc;
pub mod model;
pub mod plugin;
pub mod registry;
pub mod resources;
pub mod server;

// Re-exports: registry
pub use registry::{CompositeRegistry, ToolRegistry, ToolResult, check_required};

// Re-exports: plugins
pub use plugin::{Plugin, PluginManifest, PluginRegistry, PluginTool};

// Re-exports: resources
pub use resources::{ResourceFuture, ResourceRegistry};

// Re-exports: server
pub use server::{McpCore, McpServer, SUPPORTED_PROTOCOL_VERSIONS};

// Re-exports: framing
pub use jsonrpc::{JsonRpcRequest, JsonRpcResponse};

// Re-exports: error
pub use error::{Error, Result};
