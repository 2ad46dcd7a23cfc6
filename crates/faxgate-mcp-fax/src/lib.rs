//! Fax MCP tools for faxgate.
//!
//! This crate provides the native fax tools, the inbound-PDF resource
//! handler and the example `status` plugin. Everything talks to the fax
//! API through `faxgate_client::FaxApi`.
//!
//! # Tools
//!
//! - `send_fax`: submit a PDF or text document (local path, URL or base64)
//! - `get_fax_status`: status of an outbound job
//! - `get_fax`: outbound job or inbound fax by id
//! - `list_inbound`: recent inbound faxes
//! - `get_inbound_pdf`: inbound PDF inline or as a resource reference
//!
//! # Example
//!
//! ```rust,ignore
//! use faxgate_mcp_fax::{FaxTools, InboundResources, StatusPlugin};
//!
//! let api: Arc<dyn FaxApi> = Arc::new(FaxClient::new(&config.fax_api)?);
//! let mut plugins = PluginRegistry::new();
//! plugins.register(StatusPlugin::new(api.clone()))?;
//!
//! let registry = CompositeRegistry::new()
//!     .add(FaxTools::new(api.clone()))?
//!     .add(plugins)?;
//! let server = McpServer::new(registry).with_resources(InboundResources::new(api));
//! ```

pub mod documents;
pub mod errors;
pub mod ids;
pub mod resources;
pub mod status;
pub mod tools;

// Re-exports
pub use ids::FaxIdKind;
pub use resources::{InboundResources, inbound_pdf_uri, parse_inbound_pdf_uri};
pub use status::StatusPlugin;
pub use tools::{FaxTools, GetFaxArgs, GetInboundPdfArgs, ListInboundArgs, SendFaxArgs};

#[cfg(test)]
pub(crate) mod testing;
