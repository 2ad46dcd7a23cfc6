//! Protocol model shared by all transports.
//!
//! Every payload type is `rmcp::model`'s own. This module only adds the
//! gateway's constants and a few constructors the tools share.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub use rmcp::model::{
    AnnotateAble, CallToolRequestParams, CallToolResult, Content, ErrorCode, ErrorData,
    Implementation, InitializeResult, JsonObject, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, ProtocolVersion, RawContent, RawResource,
    RawResourceTemplate, ReadResourceRequestParams, ReadResourceResult, ResourceContents,
    ResourceTemplate, ServerCapabilities, Tool,
};

/// JSON-RPC code used when a session id is missing or unknown.
pub const SESSION_NOT_FOUND: ErrorCode = ErrorCode(-32000);

/// MIME type of inbound fax documents.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Build a tool definition from a JSON schema object.
///
/// A schema that is not an object is replaced by an empty one.
pub fn make_tool(name: &str, description: &str, schema: Value) -> Tool {
    Tool::new(name.to_string(), description.to_string(), json_schema(schema))
}

fn json_schema(value: Value) -> Arc<JsonObject> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

/// Content item pointing at a resource the caller reads separately.
pub fn resource_link(
    uri: impl Into<String>,
    name: impl Into<String>,
    mime_type: impl Into<String>,
) -> Content {
    Content::resource_link(RawResource::new(uri, name).with_mime_type(mime_type))
}

/// Base64 blob contents for a binary resource.
pub fn blob_contents(
    uri: impl Into<String>,
    mime_type: impl Into<String>,
    bytes: &[u8],
) -> ResourceContents {
    ResourceContents::blob(STANDARD.encode(bytes), uri).with_mime_type(mime_type)
}

/// Raw bytes of resource contents. Text contents yield their UTF-8 bytes.
pub fn contents_bytes(contents: &ResourceContents) -> Result<Vec<u8>, base64::DecodeError> {
    match contents {
        ResourceContents::BlobResourceContents { blob, .. } => STANDARD.decode(blob),
        ResourceContents::TextResourceContents { text, .. } => Ok(text.as_bytes().to_vec()),
    }
}

/// Text of the first text item of a tool result.
pub fn first_text(result: &CallToolResult) -> Option<&str> {
    result
        .content
        .iter()
        .find_map(|item| item.as_text())
        .map(|t| t.text.as_str())
}

/// Serialize `value` as a pretty-printed JSON text result.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
