//! Liveness probe shared by the network transports.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::session::TransportKind;

/// Body of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Transport answering the probe.
    pub transport: String,
    /// Server name.
    pub server: String,
    /// Server version.
    pub version: String,
}

impl HealthResponse {
    /// Healthy response for `kind`.
    pub fn ok(kind: TransportKind, server: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            transport: kind.as_str().to_string(),
            server: server.to_string(),
            version: version.to_string(),
        }
    }
}

/// Unauthenticated `GET /health` route.
pub fn health_routes(kind: TransportKind, server: &str, version: &str) -> Router {
    let response = Arc::new(HealthResponse::ok(kind, server, version));
    Router::new()
        .route("/health", get(health))
        .with_state(response)
}

async fn health(State(response): State<Arc<HealthResponse>>) -> Json<HealthResponse> {
    Json(response.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_transport() {
        let resp = health_routes(TransportKind::Sse, "faxgate-mcp", "1.2.3")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, HealthResponse::ok(TransportKind::Sse, "faxgate-mcp", "1.2.3"));
        assert_eq!(body.transport, "sse");
        assert_eq!(body.status, "ok");
    }
}
