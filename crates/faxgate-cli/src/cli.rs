//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use faxgate_core::GatewayConfig;
use faxgate_server::TransportKind;

/// MCP tool gateway for a fax API
#[derive(Parser, Debug)]
#[command(name = "faxgate", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "FAXGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Command {
    /// Serve JSON-RPC over stdin/stdout
    Stdio,
    /// Serve streamable HTTP on /mcp
    Http {
        /// Listen port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Serve Server-Sent Events with OAuth2 bearer tokens
    Sse {
        /// Listen port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Serve the WebSocket protocol
    Socket {
        /// Listen port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Inspect or create the configuration file
    Config {
        /// What to do with the configuration
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Command {
    /// Transport this command launches, if any.
    pub fn transport(&self) -> Option<TransportKind> {
        match self {
            Command::Stdio => Some(TransportKind::Stdio),
            Command::Http { .. } => Some(TransportKind::StreamableHttp),
            Command::Sse { .. } => Some(TransportKind::Sse),
            Command::Socket { .. } => Some(TransportKind::WebSocket),
            Command::Config { .. } => None,
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut GatewayConfig) {
        match *self {
            Command::Http { port: Some(port) } => config.http.port = port,
            Command::Sse { port: Some(port) } => config.sse.port = port,
            Command::Socket { port: Some(port) } => config.socket.port = port,
            _ => {}
        }
    }
}

/// `faxgate config` subcommands.
#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print the config file path that would be read
    Path,
    /// Print the effective configuration with secrets masked
    Show,
    /// Print one value by dotted key, e.g. `sse.port`
    Get {
        /// Dotted key
        key: String,
    },
    /// Write a default configuration file
    Init {
        /// Where to write (defaults to the platform config directory)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
