//! MCP server and per-session dispatch core.
//!
//! [`McpServer`] holds what every session shares: the tool registry, the
//! resource registry and the server identity. Each session gets its own
//! [`McpCore`] from [`McpServer::core`]. A core handles one request at a
//! time, so requests of a session complete in arrival order while
//! different sessions proceed independently.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{
    InitializeRequestParams, ListPromptsResult, PaginatedRequestParams, ServerInfo,
};
use rmcp::service::{NotificationContext, RequestContext};
use rmcp::{RoleServer, ServerHandler};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::model::{
    CallToolRequestParams, CallToolResult, ErrorCode, ErrorData, Implementation,
    InitializeResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    ProtocolVersion, ReadResourceRequestParams, ReadResourceResult, ServerCapabilities, Tool,
};
use crate::registry::{ToolRegistry, check_required};
use crate::resources::ResourceRegistry;

/// Protocol versions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[ProtocolVersion] = &[
    ProtocolVersion::V_2025_06_18,
    ProtocolVersion::V_2025_03_26,
    ProtocolVersion::V_2024_11_05,
];

struct Shared {
    registry: Box<dyn ToolRegistry>,
    resources: Option<Box<dyn ResourceRegistry>>,
    name: String,
    version: String,
    instructions: Option<String>,
}

/// Shared MCP server state.
///
/// # Example
///
/// ```rust,ignore
/// let server = McpServer::new(registry)
///     .with_resources(InboundResources::new(api))
///     .with_name("faxgate-mcp");
///
/// let core = server.core();
/// ```
#[derive(Clone)]
pub struct McpServer {
    shared: Arc<Shared>,
}

impl McpServer {
    /// Create a server over a tool registry.
    pub fn new<R: ToolRegistry + 'static>(registry: R) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Box::new(registry),
                resources: None,
                name: "faxgate-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instructions: None,
            }),
        }
    }

    /// Attach a resource registry.
    pub fn with_resources<R: ResourceRegistry + 'static>(self, resources: R) -> Self {
        self.map_shared(|s| s.resources = Some(Box::new(resources)))
    }

    /// Set the server name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.map_shared(|s| s.name = name)
    }

    /// Set the server version.
    pub fn with_version(self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.map_shared(|s| s.version = version)
    }

    /// Set instructions returned from `initialize`.
    pub fn with_instructions(self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.map_shared(|s| s.instructions = Some(instructions))
    }

    // Builders run before the server is shared, so the Arc is still unique.
    fn map_shared(self, f: impl FnOnce(&mut Shared)) -> Self {
        match Arc::try_unwrap(self.shared) {
            Ok(mut shared) => {
                f(&mut shared);
                Self {
                    shared: Arc::new(shared),
                }
            }
            Err(shared) => {
                log::warn!("McpServer configured after being shared; change ignored");
                Self { shared }
            }
        }
    }

    /// Server name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Server version.
    pub fn version(&self) -> &str {
        &self.shared.version
    }

    /// Number of tools exposed.
    pub fn tool_count(&self) -> usize {
        self.shared.registry.tool_count()
    }

    /// Fresh dispatch core for a new session.
    pub fn core(&self) -> McpCore {
        McpCore {
            shared: Arc::clone(&self.shared),
            state: Arc::new(Mutex::new(CoreState::default())),
        }
    }
}

#[derive(Debug, Default)]
struct CoreState {
    protocol_version: Option<ProtocolVersion>,
    initialized: bool,
}

/// Per-session dispatch core.
///
/// Cloning yields a handle to the same session. The core also implements
/// [`ServerHandler`], so one session can be served by rmcp's own runtime
/// with `rmcp::serve_server(core, transport)`.
#[derive(Clone)]
pub struct McpCore {
    shared: Arc<Shared>,
    state: Arc<Mutex<CoreState>>,
}

impl McpCore {
    /// Handle one message. Notifications produce no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let mut state = self.state.lock().await;

        let Some(id) = request.id else {
            if request.method == "notifications/initialized" {
                state.initialized = true;
            }
            log::debug!("Notification: {}", request.method);
            return None;
        };

        log::debug!("Request {id}: {}", request.method);
        let outcome = guarded(
            self.dispatch(&mut state, &request.method, request.params),
            &request.method,
        )
        .await;

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    /// Negotiated protocol version, once `initialize` has run.
    pub async fn protocol_version(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .protocol_version
            .as_ref()
            .map(ToString::to_string)
    }

    /// Whether the client confirmed initialization.
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }

    async fn dispatch(
        &self,
        state: &mut CoreState,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ErrorData> {
        match method {
            "initialize" => {
                let requested = params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str);
                to_value(&self.negotiate(state, requested))
            }
            "ping" => Ok(json!({})),
            "tools/list" => to_value(&ListToolsResult::with_all_items(self.list_tools())),
            "tools/call" => {
                let params: CallToolRequestParams = parse_params(params)?;
                let arguments = params.arguments.map(Value::Object).unwrap_or(Value::Null);
                to_value(&self.call_tool(&params.name, arguments).await?)
            }
            "resources/list" => to_value(&ListResourcesResult::with_all_items(Vec::new())),
            "resources/templates/list" => to_value(&ListResourceTemplatesResult::with_all_items(
                self.resource_templates(),
            )),
            "resources/read" => {
                let params: ReadResourceRequestParams = parse_params(params)?;
                to_value(&self.read_resource(&params.uri).await?)
            }
            "prompts/list" => to_value(&ListPromptsResult::with_all_items(Vec::new())),
            "prompts/get" => Err(ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                "No prompts are defined",
                None,
            )),
            other => Err(ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
                None,
            )),
        }
    }

    fn negotiate(&self, state: &mut CoreState, requested: Option<&str>) -> InitializeResult {
        let version = requested
            .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| v.as_str() == r))
            .unwrap_or(&SUPPORTED_PROTOCOL_VERSIONS[0])
            .clone();
        state.protocol_version = Some(version.clone());
        self.server_info(version)
    }

    fn server_info(&self, version: ProtocolVersion) -> InitializeResult {
        let capabilities = ServerCapabilities::builder()
            .enable_prompts()
            .enable_resources()
            .enable_tools()
            .build();
        let info = InitializeResult::new(capabilities)
            .with_server_info(Implementation::new(
                &self.shared.name,
                &self.shared.version,
            ))
            .with_protocol_version(version);
        match &self.shared.instructions {
            Some(instructions) => info.with_instructions(instructions.clone()),
            None => info,
        }
    }

    /// All tool definitions.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.shared.registry.tools()
    }

    fn resource_templates(&self) -> Vec<crate::model::ResourceTemplate> {
        self.shared
            .resources
            .as_ref()
            .map(|r| r.templates())
            .unwrap_or_default()
    }

    /// Run a tool by its exact listed name.
    ///
    /// Required parameters from the tool's schema are checked before the
    /// handler runs. A panicking handler yields an internal error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData> {
        let registry = &self.shared.registry;
        let tool = registry.tool(name).ok_or_else(|| unknown_tool(name))?;

        let arguments = match arguments {
            Value::Null => json!({}),
            Value::Object(_) => arguments,
            _ => {
                return Err(ErrorData::invalid_params(
                    "Tool arguments must be an object",
                    None,
                ));
            }
        };
        check_required(&tool, &arguments)?;

        let future = registry.call(name, arguments).ok_or_else(|| unknown_tool(name))?;
        guarded(future, name).await
    }

    /// Dereference a resource URI.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ErrorData> {
        let future = self
            .shared
            .resources
            .as_ref()
            .and_then(|r| r.read(uri))
            .ok_or_else(|| {
                ErrorData::invalid_params(format!("Unsupported resource uri: {uri}"), None)
            })?;
        guarded(future, uri).await
    }
}

impl ServerHandler for McpCore {
    fn get_info(&self) -> ServerInfo {
        self.server_info(SUPPORTED_PROTOCOL_VERSIONS[0].clone())
    }

    async fn initialize(
        &self,
        request: InitializeRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, ErrorData> {
        let requested = request.protocol_version.clone();
        context.peer.set_peer_info(request);
        let mut state = self.state.lock().await;
        Ok(self.negotiate(&mut state, Some(requested.as_str())))
    }

    async fn on_initialized(&self, _context: NotificationContext<RoleServer>) {
        self.state.lock().await.initialized = true;
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(McpCore::list_tools(self)))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let _state = self.state.lock().await;
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        McpCore::call_tool(self, &request.name, arguments).await
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(ListResourceTemplatesResult::with_all_items(
            self.resource_templates(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let _state = self.state.lock().await;
        McpCore::read_resource(self, &request.uri).await
    }
}

fn unknown_tool(name: &str) -> ErrorData {
    ErrorData::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Unknown tool: {name}"),
        None,
    )
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, ErrorData> {
    serde_json::from_value(params.unwrap_or_else(|| json!({})))
        .map_err(|e| ErrorData::invalid_params(e.to_string(), None))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(value).map_err(|e| ErrorData::internal_error(e.to_string(), None))
}

/// Await `future`, converting a panic into an internal error.
async fn guarded<T, F>(future: F, what: &str) -> Result<T, ErrorData>
where
    F: Future<Output = Result<T, ErrorData>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Handler for {what} panicked: {detail}");
            Err(ErrorData::internal_error(
                format!("Internal error while handling {what}"),
                None,
            ))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
