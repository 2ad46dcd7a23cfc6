//! Server-Sent Events transport with OAuth2 bearer tokens.
//!
//! `GET /sse` opens a session. Its first event, `endpoint`, names the URL
//! the client POSTs messages to (`/messages?sessionId=<id>`); responses come
//! back on the stream as `message` events. Closing the stream or
//! `DELETE /messages` ends the session.
//!
//! Both endpoints require a bearer token accepted by the configured
//! authenticator. Every rejection looks the same to the caller.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use faxgate_auth::{AuthConfig, AuthLayer, Authenticator, principal_from_parts};
use faxgate_auth_mcp::{DiscoveryConfig, discovery_routes};
use faxgate_mcp::McpServer;
use faxgate_mcp::jsonrpc::parse_bytes;
use futures::{Stream, StreamExt};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::Result;
use crate::health::health_routes;
use crate::streamable_http::MAX_BODY_BYTES;
use crate::session::{Session, SessionGuard, SessionManager, TransportKind};
use crate::transport::{SESSION_ID_HEADER, Transport, serve_router, with_http_layers};

/// Path of the message back-channel.
pub const MESSAGES_PATH: &str = "/messages";

/// The SSE transport.
pub struct SseTransport<A: Authenticator> {
    sessions: SessionManager,
    authenticator: Arc<A>,
    discovery: Option<DiscoveryConfig>,
    addr: SocketAddr,
}

impl<A: Authenticator> SseTransport<A> {
    /// Transport serving `server` on `addr`, admitting requests that
    /// `authenticator` accepts.
    pub fn new(server: McpServer, authenticator: A, addr: SocketAddr) -> Self {
        Self {
            sessions: SessionManager::new(server, TransportKind::Sse),
            authenticator: Arc::new(authenticator),
            discovery: None,
            addr,
        }
    }

    /// Serve OAuth discovery documents and point 401s at them.
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// The transport's session table.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Routes for this transport, with auth, tracing and CORS applied.
    pub fn router(&self) -> Router {
        let auth = AuthLayer::new(
            self.authenticator.clone(),
            AuthConfig {
                enabled: true,
                resource_url: self.discovery.as_ref().map(|d| d.resource_url.clone()),
            },
        );
        let server = self.sessions.server();

        let mut router = Router::new()
            .route("/sse", get(open_stream))
            .route(MESSAGES_PATH, post(post_message).delete(close_session))
            .route_layer(auth)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .with_state(self.sessions.clone())
            .merge(health_routes(TransportKind::Sse, server.name(), server.version()));

        if let Some(discovery) = &self.discovery {
            router = router.merge(discovery_routes(discovery.clone()));
        }
        with_http_layers(router)
    }
}

#[async_trait]
impl<A: Authenticator> Transport for SseTransport<A> {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
    }

    async fn serve(self: Box<Self>) -> Result<()> {
        serve_router(self.router(), self.addr, self.sessions.clone()).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn open_stream(
    State(sessions): State<SessionManager>,
    parts: http::request::Parts,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = sessions.create_with_outbox(tx);
    let guard = SessionGuard::new(sessions.clone(), &session);
    let subject = principal_from_parts(&parts).map_or("unknown", |p| p.subject.as_str());
    log::info!("SSE session {} opened for {subject}", session.id());

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?sessionId={}", session.id()));
    let messages = UnboundedReceiverStream::new(rx)
        .map(|response| Event::default().event("message").data(response.to_json()));

    // The guard lives as long as the stream, so a disconnect ends the session.
    let stream = futures::stream::once(async move { endpoint })
        .chain(messages)
        .map(move |event| {
            let _guard = &guard;
            Ok(event)
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn post_message(
    State(sessions): State<SessionManager>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(session) = lookup(&sessions, &query, &headers) else {
        return invalid_session();
    };

    let request = match parse_bytes(&body) {
        Ok(request) => request,
        Err(error) => return (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    };

    if let Some(response) = session.core().handle(request).await {
        if !session.push(response) {
            log::warn!("SSE session {} has no open stream; response dropped", session.id());
        }
    }
    (StatusCode::ACCEPTED, "Accepted").into_response()
}

async fn close_session(
    State(sessions): State<SessionManager>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(session) = lookup(&sessions, &query, &headers) else {
        return invalid_session();
    };
    sessions.remove(session.id());
    StatusCode::NO_CONTENT.into_response()
}

fn lookup(sessions: &SessionManager, query: &SessionQuery, headers: &HeaderMap) -> Option<Session> {
    let id = query.session_id.as_deref().or_else(|| {
        headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    })?;
    sessions.get(id)
}

fn invalid_session() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid or missing sessionId" })),
    )
        .into_response()
}
