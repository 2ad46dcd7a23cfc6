//! Streamable HTTP transport.
//!
//! `POST /mcp` carries JSON-RPC messages. An `initialize` request without a
//! session id allocates a session and returns its id in `Mcp-Session-Id`;
//! every other request must carry a live id. `GET /mcp` opens the session's
//! server-to-client stream and `DELETE /mcp` ends the session.
//!
//! Every `/mcp` request needs the shared secret as a bearer token or
//! `X-API-Key`. With no secret configured all requests are refused.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use faxgate_auth::{AuthConfig, AuthLayer, SharedSecret};
use faxgate_mcp::jsonrpc::parse_bytes;
use faxgate_mcp::model::{ErrorData, SESSION_NOT_FOUND};
use faxgate_mcp::{JsonRpcResponse, McpServer};
use futures::StreamExt;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::Value;

use crate::error::Result;
use crate::health::health_routes;
use crate::session::{Session, SessionManager, TransportKind};
use crate::transport::{SESSION_ID_HEADER, Transport, serve_router, with_http_layers};

/// Largest accepted request body. Inline documents travel base64-encoded.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const NO_VALID_SESSION: &str = "Bad Request: No valid session ID provided";
const INVALID_SESSION: &str = "Invalid or missing session ID";

/// The streamable HTTP transport.
pub struct HttpTransport {
    sessions: SessionManager,
    auth: Arc<SharedSecret>,
    addr: SocketAddr,
}

impl HttpTransport {
    /// Transport serving `server` on `addr`, guarded by `api_key`.
    pub fn new(server: McpServer, api_key: Option<String>, addr: SocketAddr) -> Self {
        let auth = SharedSecret::for_http(api_key);
        if !auth.is_configured() {
            log::warn!("No HTTP API key configured: every /mcp request will be refused");
        }
        Self {
            sessions: SessionManager::new(server, TransportKind::StreamableHttp),
            auth: Arc::new(auth),
            addr,
        }
    }

    /// The transport's session table.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Routes for this transport, with auth, tracing and CORS applied.
    pub fn router(&self) -> Router {
        let auth = AuthLayer::new(
            self.auth.clone(),
            AuthConfig {
                enabled: true,
                resource_url: None,
            },
        );
        let server = self.sessions.server();
        let mcp = Router::new()
            .route("/mcp", post(post_mcp).get(get_mcp).delete(delete_mcp))
            .route_layer(auth)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .with_state(self.sessions.clone());

        with_http_layers(mcp.merge(health_routes(
            TransportKind::StreamableHttp,
            server.name(),
            server.version(),
        )))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::StreamableHttp
    }

    async fn serve(self: Box<Self>) -> Result<()> {
        serve_router(self.router(), self.addr, self.sessions.clone()).await
    }
}

async fn post_mcp(
    State(sessions): State<SessionManager>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_bytes(&body) {
        Ok(request) => request,
        Err(error) => return (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    };

    let session_id = session_id(&headers);
    let session = match session_id.and_then(|id| sessions.get(id)) {
        Some(session) => session,
        None if session_id.is_none() && request.is_initialize() && !request.is_notification() => {
            sessions.create()
        }
        None => {
            log::debug!(
                "Rejected {} for session {}",
                request.method,
                session_id.unwrap_or("<none>")
            );
            return no_valid_session();
        }
    };

    let mut response = match session.core().handle(request).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    attach_session_id(&mut response, &session);
    response
}

async fn get_mcp(State(sessions): State<SessionManager>, headers: HeaderMap) -> Response {
    let Some(session) = session_id(&headers).and_then(|id| sessions.get(id)) else {
        return (StatusCode::BAD_REQUEST, INVALID_SESSION).into_response();
    };

    // Nothing is pushed server-side yet; the stream stays open until the
    // session ends.
    let stream = futures::stream::once(session.closed())
        .filter_map(|()| async { None::<std::result::Result<Event, Infallible>> });
    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response();
    attach_session_id(&mut response, &session);
    response
}

async fn delete_mcp(State(sessions): State<SessionManager>, headers: HeaderMap) -> Response {
    match session_id(&headers).and_then(|id| sessions.remove(id)) {
        Some(_) => StatusCode::OK.into_response(),
        None => (StatusCode::BAD_REQUEST, INVALID_SESSION).into_response(),
    }
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn attach_session_id(response: &mut Response, session: &Session) {
    if let Ok(value) = HeaderValue::from_str(session.id()) {
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }
}

fn no_valid_session() -> Response {
    let error = JsonRpcResponse::error(
        Value::Null,
        ErrorData::new(SESSION_NOT_FOUND, NO_VALID_SESSION, None),
    );
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}
