//! # faxgate-server
//!
//! The four wire transports of the faxgate MCP gateway. Each one owns a
//! [`SessionManager`] whose sessions get their own [`faxgate_mcp::McpCore`],
//! and all of them dispatch into the same [`faxgate_mcp::McpServer`].
//!
//! | Transport | Session handshake | Authentication |
//! |-----------|-------------------|----------------|
//! | [`StdioTransport`] | implicit | none |
//! | [`HttpTransport`] | `initialize` → `Mcp-Session-Id` | shared secret, fail closed |
//! | [`SseTransport`] | `GET /sse` → `endpoint` event | bearer JWT |
//! | [`SocketTransport`] | connect | shared key, fail open |

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod health;
pub mod session;
pub mod socket;
pub mod sse;
pub mod stdio;
pub mod streamable_http;
pub mod transport;

#[cfg(test)]
mod parity;

pub use error::{Error, Result};
pub use health::HealthResponse;
pub use session::{Session, SessionGuard, SessionManager, TransportKind};
pub use socket::SocketTransport;
pub use sse::SseTransport;
pub use stdio::StdioTransport;
pub use streamable_http::HttpTransport;
pub use transport::{Transport, listen_addr};
