//! Gateway configuration.
//!
//! Configuration is resolved in three layers:
//!
//! 1. Built-in defaults (`GatewayConfig::default()`)
//! 2. A TOML file (explicit `--config`, `./faxgate.toml`, or
//!    `<config_dir>/faxgate/config.toml`)
//! 3. Environment variables
//!
//! ```toml
//! [fax_api]
//! base_url = "http://localhost:8080"
//! api_key = "secret"
//!
//! [http]
//! port = 3001
//! api_key = "mcp-secret"
//!
//! [sse]
//! issuer = "https://auth.example.com"
//! audience = "faxgate"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "faxgate.toml";

const REDACTED: &str = "********";

/// Top-level gateway configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server identity and bind address.
    pub server: ServerConfig,
    /// Upstream fax API.
    pub fax_api: FaxApiConfig,
    /// Streamable HTTP transport.
    pub http: HttpConfig,
    /// SSE transport with OAuth2.
    pub sse: SseConfig,
    /// WebSocket transport.
    pub socket: SocketConfig,
}

/// Server identity reported during `initialize` and on health probes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name.
    pub name: String,
    /// Interface the network transports bind to.
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "faxgate-mcp".to_string(),
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Upstream fax API client settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaxApiConfig {
    /// Base URL of the fax API.
    pub base_url: String,
    /// Sent as `X-API-Key` when present.
    pub api_key: Option<String>,
    /// Timeout for fax submission and PDF downloads.
    pub send_timeout_secs: u64,
    /// Timeout for status and listing calls.
    pub request_timeout_secs: u64,
    /// Timeout for fetching `fileUrl` documents.
    pub fetch_timeout_secs: u64,
    /// Largest `fileUrl` document accepted, in bytes.
    pub fetch_max_bytes: usize,
}

impl Default for FaxApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            send_timeout_secs: 30,
            request_timeout_secs: 10,
            fetch_timeout_secs: 30,
            fetch_max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Streamable HTTP transport settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen port.
    pub port: u16,
    /// Shared secret. Every request is rejected while unset.
    pub api_key: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            api_key: None,
        }
    }
}

/// SSE transport settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SseConfig {
    /// Listen port.
    pub port: u16,
    /// Expected `iss` claim.
    pub issuer: Option<String>,
    /// Expected `aud` claim.
    pub audience: Option<String>,
    /// JWKS endpoint. Derived from the issuer when unset.
    pub jwks_url: Option<String>,
    /// Public URL of this resource server, advertised in discovery metadata.
    pub resource_url: Option<String>,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            port: 3002,
            issuer: None,
            audience: None,
            jwks_url: None,
            resource_url: None,
        }
    }
}

impl SseConfig {
    /// Issuer with any trailing slash removed.
    pub fn issuer(&self) -> Option<String> {
        self.issuer
            .as_deref()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
    }

    /// Configured JWKS URL, or `<issuer>/.well-known/jwks.json`.
    pub fn jwks_url(&self) -> Option<String> {
        self.jwks_url
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.issuer().map(|i| format!("{i}/.well-known/jwks.json")))
    }

    /// Names of the settings that still need a value.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.issuer().is_none() {
            missing.push("issuer");
        }
        if self.audience.as_deref().is_none_or(str::is_empty) {
            missing.push("audience");
        }
        if self.jwks_url().is_none() {
            missing.push("jwks_url");
        }
        missing
    }
}

/// WebSocket transport settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Listen port.
    pub port: u16,
    /// Shared key. Connections are accepted unauthenticated while unset.
    pub api_key: Option<String>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            port: 3004,
            api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(path) {
            Some(p) => Self::from_file(&p)?,
            None => {
                if let Some(p) = path {
                    return Err(Error::config(format!(
                        "Config file does not exist: {}",
                        p.display()
                    )));
                }
                Self::default()
            }
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        log::debug!("Loading configuration from {}", path.display());
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Find the config file to read.
    ///
    /// An explicit path wins when it exists; otherwise `./faxgate.toml`,
    /// then the platform config directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return path.exists().then(|| path.to_path_buf());
        }
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::default_path().filter(|p| p.exists())
    }

    /// `<config_dir>/faxgate/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("faxgate").join("config.toml"))
    }

    /// Overlay environment variables using the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("FAX_API_URL") {
            self.fax_api.base_url = v;
        }
        if let Some(v) = get("API_KEY") {
            self.fax_api.api_key = Some(v);
        }
        if let Some(v) = get("MCP_HTTP_PORT") {
            self.http.port = parse_port("MCP_HTTP_PORT", &v)?;
        }
        if let Some(v) = get("MCP_HTTP_API_KEY") {
            self.http.api_key = Some(v);
        }
        if let Some(v) = get("MCP_SSE_PORT") {
            self.sse.port = parse_port("MCP_SSE_PORT", &v)?;
        }
        if let Some(v) = get("OAUTH_ISSUER") {
            self.sse.issuer = Some(v);
        }
        if let Some(v) = get("OAUTH_AUDIENCE") {
            self.sse.audience = Some(v);
        }
        if let Some(v) = get("OAUTH_JWKS_URL") {
            self.sse.jwks_url = Some(v);
        }
        if let Some(v) = get("MCP_SSE_RESOURCE_URL") {
            self.sse.resource_url = Some(v);
        }
        if let Some(v) = get("MCP_WS_PORT") {
            self.socket.port = parse_port("MCP_WS_PORT", &v)?;
        }
        if let Some(v) = get("MCP_WS_API_KEY").or_else(|| get("API_KEY")) {
            self.socket.api_key = Some(v);
        }
        Ok(())
    }

    /// Copy of the configuration with every secret masked.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        let mut out = self.clone();
        out.fax_api.api_key = mask(&self.fax_api.api_key);
        out.http.api_key = mask(&self.http.api_key);
        out.socket.api_key = mask(&self.socket.api_key);
        out
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{key} must be a port number, got '{value}'")))
}

// ============================================================================
// Tests
// ============================================================================
