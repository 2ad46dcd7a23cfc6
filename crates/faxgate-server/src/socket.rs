//! WebSocket transport with a shared key.
//!
//! Not JSON-RPC: each text frame is `{ id?, method, name?, arguments? }`
//! with `method` one of `list_tools` or `call_tool`. Replies echo `id`.
//!
//! The key is checked once when the connection opens, from `?key=` or
//! `X-API-Key`. A rejected connection is closed with code 1008 before any
//! frame is read. With no key configured every connection is admitted.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use faxgate_auth::{Credentials, SharedSecret};
use faxgate_mcp::model::{ErrorCode, ErrorData};
use faxgate_mcp::{McpCore, McpServer};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::health::health_routes;
use crate::session::{SessionGuard, SessionManager, TransportKind};
use crate::transport::{Transport, serve_router};

/// The WebSocket transport.
pub struct SocketTransport {
    state: SocketState,
    addr: SocketAddr,
}

#[derive(Clone)]
struct SocketState {
    sessions: SessionManager,
    auth: Arc<SharedSecret>,
}

impl SocketTransport {
    /// Transport serving `server` on `addr`, guarded by `api_key` when set.
    pub fn new(server: McpServer, api_key: Option<String>, addr: SocketAddr) -> Self {
        let auth = SharedSecret::for_socket(api_key);
        if !auth.is_configured() {
            log::warn!("No WebSocket key configured: connections are unauthenticated");
        }
        Self {
            state: SocketState {
                sessions: SessionManager::new(server, TransportKind::WebSocket),
                auth: Arc::new(auth),
            },
            addr,
        }
    }

    /// The transport's session table.
    pub fn sessions(&self) -> &SessionManager {
        &self.state.sessions
    }

    /// Routes for this transport, with request tracing applied.
    pub fn router(&self) -> Router {
        let server = self.state.sessions.server();
        Router::new()
            .route("/", get(upgrade))
            .route("/ws", get(upgrade))
            .with_state(self.state.clone())
            .merge(health_routes(
                TransportKind::WebSocket,
                server.name(),
                server.version(),
            ))
            .layer(tower_http::trace::TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Transport for SocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn serve(self: Box<Self>) -> Result<()> {
        serve_router(self.router(), self.addr, self.state.sessions.clone()).await
    }
}

async fn upgrade(
    State(state): State<SocketState>,
    headers: HeaderMap,
    uri: Uri,
    ws: WebSocketUpgrade,
) -> Response {
    let credentials = Credentials::from_headers_and_uri(&headers, &uri);
    let authorized = match state.auth.check(&credentials) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("WebSocket connection rejected: {e}");
            false
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, authorized))
}

async fn handle_socket(mut socket: WebSocket, state: SocketState, authorized: bool) {
    if !authorized {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "Unauthorized".into(),
            })))
            .await;
        return;
    }

    let session = state.sessions.create();
    let _guard = SessionGuard::new(state.sessions.clone(), &session);
    let server = state.sessions.server();

    let hello = json!({
        "event": "hello",
        "transport": TransportKind::WebSocket.as_str(),
        "server": server.name(),
        "version": server.version(),
    });
    if socket
        .send(Message::Text(hello.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    let closed = session.closed();
    tokio::pin!(closed);

    loop {
        let frame = tokio::select! {
            frame = socket.recv() => frame,
            () = &mut closed => {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "Server shutting down".into(),
                    })))
                    .await;
                break;
            }
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                log::debug!("WebSocket session {} read error: {e}", session.id());
                break;
            }
        };

        let reply = handle_frame(session.core(), text.as_str()).await;
        if socket
            .send(Message::Text(reply.to_string().into()))
            .await
            .is_err()
        {
            break;
        }
    }
}

#[derive(Debug, Deserialize)]
struct SocketRequest {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Answer one frame.
async fn handle_frame(core: &McpCore, text: &str) -> Value {
    let request: SocketRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            let error = ErrorData::new(ErrorCode::PARSE_ERROR, format!("Parse error: {e}"), None);
            return error_frame(Value::Null, error);
        }
    };
    let id = request.id.unwrap_or(Value::Null);

    match request.method.as_deref() {
        Some("list_tools") => json!({ "id": id, "result": { "tools": core.list_tools() } }),
        Some("call_tool") => {
            let Some(name) = request.name else {
                return error_frame(
                    id,
                    ErrorData::invalid_params("Missing required parameter: name", None),
                );
            };
            match core
                .call_tool(&name, request.arguments.unwrap_or(Value::Null))
                .await
            {
                Ok(result) => json!({ "id": id, "result": result }),
                Err(error) => error_frame(id, error),
            }
        }
        _ => error_frame(
            id,
            ErrorData::new(ErrorCode::METHOD_NOT_FOUND, "Method not found", None),
        ),
    }
}

fn error_frame(id: Value, error: ErrorData) -> Value {
    json!({ "id": id, "error": error })
}
