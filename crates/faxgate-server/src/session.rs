//! Per-transport session table.
//!
//! Each transport owns one [`SessionManager`]. Sessions are created on the
//! transport's handshake, looked up on every request and removed only by
//! the transport's close or delete path. There is no idle eviction.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use faxgate_mcp::{JsonRpcResponse, McpCore, McpServer};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Which transport a session belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Line-delimited JSON-RPC on stdin/stdout.
    Stdio,
    /// Streamable HTTP with `Mcp-Session-Id`.
    StreamableHttp,
    /// Server-Sent Events with a POST back-channel.
    Sse,
    /// WebSocket with the two-method socket protocol.
    WebSocket,
}

impl TransportKind {
    /// Name reported by health probes and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::StreamableHttp => "streamable-http",
            TransportKind::Sse => "sse",
            TransportKind::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sender half used by transports that push responses out of band.
pub type Outbox = mpsc::UnboundedSender<JsonRpcResponse>;

/// One client session bound to its own dispatch core.
///
/// Cheap to clone; clones share the core and the close signal.
#[derive(Clone)]
pub struct Session {
    id: String,
    kind: TransportKind,
    core: McpCore,
    created_at: DateTime<Utc>,
    outbox: Option<Outbox>,
    closed: Arc<watch::Sender<bool>>,
}

impl Session {
    /// Session id as sent to the client.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning transport.
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// The session's dispatch core.
    pub fn core(&self) -> &McpCore {
        &self.core
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Push a response to the session's stream.
    ///
    /// Returns false if the session has no stream or its receiver is gone.
    pub fn push(&self, response: JsonRpcResponse) -> bool {
        self.outbox
            .as_ref()
            .is_some_and(|outbox| outbox.send(response).is_ok())
    }

    /// Whether the session was removed from its table.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the session is removed from its table.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.closed.subscribe();
        async move {
            let _ = rx.wait_for(|closed| *closed).await;
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Session table for one transport.
///
/// The table is the single source of truth for which ids are live. Unknown
/// ids are never recreated.
#[derive(Clone)]
pub struct SessionManager {
    server: McpServer,
    kind: TransportKind,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionManager {
    /// Empty table for `kind`, minting cores from `server`.
    pub fn new(server: McpServer, kind: TransportKind) -> Self {
        Self {
            server,
            kind,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The server sessions are minted from.
    pub fn server(&self) -> &McpServer {
        &self.server
    }

    /// Transport this table belongs to.
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Create a session with a fresh core and id.
    pub fn create(&self) -> Session {
        self.insert(None)
    }

    /// Create a session whose responses are pushed to `outbox`.
    pub fn create_with_outbox(&self, outbox: Outbox) -> Session {
        self.insert(Some(outbox))
    }

    fn insert(&self, outbox: Option<Outbox>) -> Session {
        let (closed, _) = watch::channel(false);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            core: self.server.core(),
            created_at: Utc::now(),
            outbox,
            closed: Arc::new(closed),
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id.clone(), session.clone());
        log::info!("{} session {} created", self.kind, session.id);
        session
    }

    /// Look up a live session.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Remove a session and signal its close.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(session) = &removed {
            session.closed.send_replace(true);
            log::info!("{} session {} closed", self.kind, session.id);
        }
        removed
    }

    /// Remove every session, returning how many were live.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Session> = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, session)| session)
            .collect();
        for session in &drained {
            session.closed.send_replace(true);
        }
        drained.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its session when dropped.
///
/// Held by connection-scoped transports so that any way a connection ends
/// tears its session down.
pub struct SessionGuard {
    sessions: SessionManager,
    id: String,
}

impl SessionGuard {
    /// Guard `session` in `sessions`.
    pub fn new(sessions: SessionManager, session: &Session) -> Self {
        Self {
            sessions,
            id: session.id.clone(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use faxgate_mcp::model::{CallToolResult, Content, ErrorData, Tool, make_tool};
    use faxgate_mcp::{JsonRpcRequest, ToolRegistry, ToolResult};
    use serde_json::{Value, json};

    /// Registry with one `echo` tool returning its `text` argument.
    pub(crate) struct EchoTools;

    impl ToolRegistry for EchoTools {
        fn tools(&self) -> Vec<Tool> {
            vec![make_tool(
                "echo",
                "Echo text back",
                json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            )]
        }

        fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
            if name != "echo" {
                return None;
            }
            Some(Box::pin(async move {
                let text = args
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ErrorData::invalid_params("text must be a string", None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }))
        }
    }

    pub(crate) fn test_server() -> McpServer {
        McpServer::new(EchoTools)
            .with_name("faxgate-test")
            .with_version("9.9.9")
    }

    #[test]
    fn test_create_and_get() {
        let sessions = SessionManager::new(test_server(), TransportKind::StreamableHttp);
        let session = sessions.create();
        assert_eq!(session.kind(), TransportKind::StreamableHttp);
        assert_eq!(sessions.get(session.id()).unwrap().id(), session.id());
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let sessions = SessionManager::new(test_server(), TransportKind::Sse);
        let a = sessions.create();
        let b = sessions.create();
        assert_ne!(a.id(), b.id());
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_unknown_id_is_not_created() {
        let sessions = SessionManager::new(test_server(), TransportKind::Sse);
        assert!(sessions.get("dangling").is_none());
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_remove_signals_close() {
        let sessions = SessionManager::new(test_server(), TransportKind::Sse);
        let session = sessions.create();
        let closed = session.closed();
        assert!(!session.is_closed());

        assert!(sessions.remove(session.id()).is_some());
        closed.await;
        assert!(session.is_closed());
        assert!(sessions.get(session.id()).is_none());
        assert!(sessions.remove(session.id()).is_none());
    }

    #[tokio::test]
    async fn test_close_all() {
        let sessions = SessionManager::new(test_server(), TransportKind::StreamableHttp);
        let a = sessions.create();
        let _b = sessions.create();
        assert_eq!(sessions.close_all(), 2);
        assert!(sessions.is_empty());
        a.closed().await;
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let sessions = SessionManager::new(test_server(), TransportKind::WebSocket);
        let session = sessions.create();
        {
            let _guard = SessionGuard::new(sessions.clone(), &session);
            assert_eq!(sessions.len(), 1);
        }
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_have_independent_cores() {
        let sessions = SessionManager::new(test_server(), TransportKind::StreamableHttp);
        let a = sessions.create();
        let b = sessions.create();
        a.core()
            .handle(JsonRpcRequest::new(
                1,
                "initialize",
                Some(json!({"protocolVersion": "2024-11-05"})),
            ))
            .await;
        assert_eq!(
            a.core().protocol_version().await.as_deref(),
            Some("2024-11-05")
        );
        assert!(b.core().protocol_version().await.is_none());
    }

    #[tokio::test]
    async fn test_push_to_outbox() {
        let sessions = SessionManager::new(test_server(), TransportKind::Sse);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = sessions.create_with_outbox(tx);
        assert!(session.push(JsonRpcResponse::success(json!(1), json!({}))));
        assert_eq!(rx.recv().await.unwrap().id, json!(1));

        let plain = sessions.create();
        assert!(!plain.push(JsonRpcResponse::success(json!(2), json!({}))));
    }
}
