//! Assembles the MCP server and the selected transport from configuration.

use std::sync::Arc;
use std::time::Duration;

use faxgate_auth::BearerAuthenticator;
use faxgate_auth_jwks::JwksTokenValidator;
use faxgate_auth_mcp::DiscoveryConfig;
use faxgate_client::{DocumentFetcher, FaxApi, FaxClient};
use faxgate_core::GatewayConfig;
use faxgate_mcp::{CompositeRegistry, McpServer, PluginRegistry};
use faxgate_mcp_fax::{FaxTools, InboundResources, StatusPlugin};
use faxgate_server::{
    HttpTransport, SocketTransport, SseTransport, StdioTransport, Transport, TransportKind,
    listen_addr,
};

use crate::error::Result;

/// Build the MCP server backed by the configured fax API.
pub fn build_server(config: &GatewayConfig) -> Result<McpServer> {
    let api: Arc<dyn FaxApi> = Arc::new(FaxClient::new(&config.fax_api)?);
    build_server_with_api(config, api)
}

/// Build the MCP server on top of an existing fax API handle.
pub fn build_server_with_api(config: &GatewayConfig, api: Arc<dyn FaxApi>) -> Result<McpServer> {
    let fetcher = DocumentFetcher::new(Duration::from_secs(config.fax_api.fetch_timeout_secs))
        .with_max_bytes(config.fax_api.fetch_max_bytes);

    let mut plugins = PluginRegistry::new();
    plugins.register(StatusPlugin::new(api.clone()))?;

    let registry = CompositeRegistry::new()
        .add(FaxTools::new(api.clone()).with_fetcher(fetcher))?
        .add(plugins)?;

    let server = McpServer::new(registry)
        .with_resources(InboundResources::new(api))
        .with_name(config.server.name.clone())
        .with_version(env!("CARGO_PKG_VERSION"));
    log::debug!(
        "Built MCP server '{}' with {} tools",
        server.name(),
        server.tool_count()
    );
    Ok(server)
}

/// Wrap `server` in the transport for `kind`.
pub fn build_transport(
    kind: TransportKind,
    config: &GatewayConfig,
    server: McpServer,
) -> Result<Box<dyn Transport>> {
    let host = config.server.host.as_str();
    let transport: Box<dyn Transport> = match kind {
        TransportKind::Stdio => Box::new(StdioTransport::new(server)),
        TransportKind::StreamableHttp => Box::new(HttpTransport::new(
            server,
            config.http.api_key.clone(),
            listen_addr(host, config.http.port)?,
        )),
        TransportKind::Sse => {
            let sse = &config.sse;
            let missing = sse.missing_settings();
            if !missing.is_empty() {
                log::warn!(
                    "SSE OAuth2 settings missing ({}); every token will be rejected",
                    missing.join(", ")
                );
            }
            let issuer = sse.issuer().unwrap_or_default();
            let jwks_url = sse.jwks_url().unwrap_or_default();
            let validator = JwksTokenValidator::new(
                jwks_url.clone(),
                issuer.clone(),
                sse.audience.clone().unwrap_or_default(),
            );
            let mut transport = SseTransport::new(
                server,
                BearerAuthenticator::new(validator),
                listen_addr(host, sse.port)?,
            );
            if let Some(resource_url) = sse.resource_url.clone().filter(|u| !u.is_empty()) {
                transport = transport.with_discovery(DiscoveryConfig {
                    resource_url,
                    issuer,
                    jwks_url,
                });
            }
            Box::new(transport)
        }
        TransportKind::WebSocket => Box::new(SocketTransport::new(
            server,
            config.socket.api_key.clone(),
            listen_addr(host, config.socket.port)?,
        )),
    };
    Ok(transport)
}

/// Build everything for `kind` and serve until shutdown.
pub async fn run(kind: TransportKind, config: &GatewayConfig) -> Result<()> {
    if config.fax_api.api_key.is_none() {
        log::warn!("No fax API key configured; upstream calls will be unauthenticated");
    }
    let server = build_server(config)?;
    let transport = build_transport(kind, config, server)?;
    log::info!("Starting {} transport", transport.kind());
    transport.serve().await?;
    log::info!("{kind} transport stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config
    }

    #[test]
    fn test_server_exposes_fax_and_plugin_tools() {
        let server = build_server(&test_config()).unwrap();
        assert_eq!(server.version(), env!("CARGO_PKG_VERSION"));

        let names: Vec<String> = server
            .core()
            .list_tools()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        for expected in [
            "send_fax",
            "get_fax_status",
            "get_fax",
            "list_inbound",
            "get_inbound_pdf",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert!(names.iter().any(|n| n == "status_check_fax_status"));
        assert_eq!(server.tool_count(), names.len());
    }

    #[test]
    fn test_server_name_from_config() {
        let mut config = test_config();
        config.server.name = "fax-prod".to_string();
        let server = build_server(&config).unwrap();
        assert_eq!(server.name(), "fax-prod");
    }

    #[test]
    fn test_build_every_transport() {
        let config = test_config();
        for kind in [
            TransportKind::Stdio,
            TransportKind::StreamableHttp,
            TransportKind::Sse,
            TransportKind::WebSocket,
        ] {
            let server = build_server(&config).unwrap();
            let transport = build_transport(kind, &config, server).unwrap();
            assert_eq!(transport.kind(), kind);
        }
    }

    #[test]
    fn test_bad_host_is_rejected() {
        let mut config = test_config();
        config.server.host = "not a host".to_string();
        let server = build_server(&config).unwrap();
        assert!(build_transport(TransportKind::StreamableHttp, &config, server).is_err());
    }
}
