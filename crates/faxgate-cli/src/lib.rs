//! # faxgate-cli
//!
//! The `faxgate` binary. One subcommand per transport, plus `config` for
//! inspecting and creating the configuration file.
//!
//! ```text
//! faxgate [--config PATH] stdio
//! faxgate [--config PATH] http   [--port N]
//! faxgate [--config PATH] sse    [--port N]
//! faxgate [--config PATH] socket [--port N]
//! faxgate [--config PATH] config path | show | get <key> | init [--file F] [--force]
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config_handlers;
pub mod error;
pub mod logging;

pub use app::{build_server, build_server_with_api, build_transport, run};
pub use cli::{Cli, Command, ConfigAction};
pub use error::{Error, Result};
