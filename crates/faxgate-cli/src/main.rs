//! faxgate
//!
//! MCP tool gateway for a fax API.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use faxgate_cli::config_handlers::handle_config_command;
use faxgate_cli::{Cli, Command, logging};
use faxgate_core::GatewayConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    if let Command::Config { action } = &cli.command {
        handle_config_command(cli.config.as_deref(), action.clone())?;
        return Ok(());
    }
    let Some(kind) = cli.command.transport() else {
        return Ok(());
    };

    let mut config =
        GatewayConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.command.apply_overrides(&mut config);

    faxgate_cli::run(kind, &config)
        .await
        .with_context(|| format!("{kind} transport failed"))
}
