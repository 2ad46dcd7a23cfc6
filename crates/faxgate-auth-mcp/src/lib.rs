//! MCP OAuth2 discovery metadata endpoints.
//!
//! Serves two discovery documents so MCP clients can find the issuer that
//! mints tokens for the SSE transport:
//!
//! - **Protected Resource Metadata** (RFC 9728) at
//!   `/.well-known/oauth-protected-resource`
//!
//! - **Authorization Server Metadata** (RFC 8414) at
//!   `/.well-known/oauth-authorization-server`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

/// What the discovery documents advertise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Public URL of this resource (e.g., `https://fax.example.com`).
    pub resource_url: String,
    /// The authorization server issuing tokens (e.g., `https://auth.example.com`).
    pub issuer: String,
    /// Where the issuer publishes its signing keys.
    pub jwks_url: String,
}

impl DiscoveryConfig {
    fn issuer(&self) -> &str {
        self.issuer.trim_end_matches('/')
    }
}

/// Create an axum `Router` with the discovery routes.
///
/// Mounts:
/// - `/.well-known/oauth-protected-resource` (+ `/sse` suffix)
/// - `/.well-known/oauth-authorization-server` (+ `/sse` suffix)
pub fn discovery_routes(config: DiscoveryConfig) -> Router {
    Router::new()
        .route(
            "/.well-known/oauth-protected-resource",
            get(protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource/sse",
            get(protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server/sse",
            get(authorization_server_metadata),
        )
        .with_state(Arc::new(config))
}

/// Returns OAuth2 Protected Resource Metadata (RFC 9728).
async fn protected_resource_metadata(State(config): State<Arc<DiscoveryConfig>>) -> Json<Value> {
    Json(json!({
        "resource": config.resource_url,
        "authorization_servers": [config.issuer()],
        "bearer_methods_supported": ["header"]
    }))
}

/// Returns OAuth2 Authorization Server Metadata (RFC 8414).
async fn authorization_server_metadata(
    State(config): State<Arc<DiscoveryConfig>>,
) -> Json<Value> {
    let issuer = config.issuer();
    Json(json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/authorize"),
        "token_endpoint": format!("{issuer}/oauth/token"),
        "jwks_uri": config.jwks_url,
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "client_credentials", "refresh_token"],
        "token_endpoint_auth_methods_supported": ["client_secret_post", "client_secret_basic"],
        "code_challenge_methods_supported": ["S256"]
    }))
}
