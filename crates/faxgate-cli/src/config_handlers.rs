//! Handler functions for `faxgate config` commands.
//!
//! Values are always read from the effective configuration (file plus
//! environment) and secrets are masked before anything is printed.

use std::path::{Path, PathBuf};

use faxgate_core::{Error, GatewayConfig, Result};

use crate::cli::ConfigAction;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
pub fn handle_config_command(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => cmd_config_show(config_path),
        ConfigAction::Get { key } => cmd_config_get(config_path, &key),
        ConfigAction::Init { file, force } => {
            let path = cmd_config_init(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// Show the config file path that would be read.
pub fn cmd_config_path(config_path: Option<&Path>) -> Result<()> {
    if let Some(path) = GatewayConfig::resolve_path(config_path) {
        println!("{}", path.display());
        return Ok(());
    }
    let candidate = match config_path {
        Some(p) => p.to_path_buf(),
        None => GatewayConfig::default_path().ok_or_else(|| {
            Error::config("Could not determine config directory for this platform")
        })?,
    };
    println!("{}", candidate.display());
    eprintln!("(file does not exist; run `faxgate config init` to create it)");
    Ok(())
}

/// Print the effective configuration as TOML with secrets masked.
pub fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = GatewayConfig::load(config_path)?;
    print!("{}", config.redacted().to_toml_string()?);
    Ok(())
}

/// Print one configuration value by dotted key.
pub fn cmd_config_get(config_path: Option<&Path>, key: &str) -> Result<()> {
    let config = GatewayConfig::load(config_path)?;
    println!("{}", lookup_value(&config, key)?);
    Ok(())
}

/// Write a default configuration file and return where it went.
pub fn cmd_config_init(file: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => p.to_path_buf(),
        None => GatewayConfig::default_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = GatewayConfig::default().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    log::debug!("Wrote default configuration to {}", path.display());
    Ok(path)
}

/// Render the value at `key` from the redacted configuration.
pub fn lookup_value(config: &GatewayConfig, key: &str) -> Result<String> {
    let value =
        toml::Value::try_from(config.redacted()).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for part in key.split('.') {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
