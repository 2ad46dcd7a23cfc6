//! JSON-RPC 2.0 framing.
//!
//! Only single messages are accepted; batches are answered with an
//! invalid-request error. Ids stay raw JSON values because a parse-error
//! reply carries `"id": null`, which `rmcp::model::RequestId` cannot hold.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{ErrorCode, ErrorData};

/// Protocol version string carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// An incoming request or notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Correlation id. Absent for notifications; an explicit `null` is kept
    /// as `Some(Value::Null)` and still gets a response.
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request with an id.
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Build a notification.
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Whether no response is expected.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Whether this is the session-opening `initialize` call.
    pub fn is_initialize(&self) -> bool {
        self.method == "initialize"
    }
}

// Only called when the key is present, so `null` maps to `Some(Null)`.
fn present_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// An outgoing response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Echoed request id, `null` when it could not be read.
    pub id: Value,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl JsonRpcResponse {
    /// Successful response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn error(id: Value, error: ErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Serialize to a single line of JSON.
    pub fn to_json(&self) -> String {
        // Serializing plain JSON values cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Decode one message, producing the error response to send back when the
/// text is not a usable request.
pub fn parse_message(text: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| parse_error(format!("Parse error: {e}")))?;
    parse_value(value)
}

/// Decode one raw frame. Bytes that are not UTF-8 get the same parse-error
/// response as malformed JSON.
pub fn parse_bytes(bytes: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| parse_error(format!("Parse error: invalid UTF-8: {e}")))?;
    parse_message(text)
}

fn parse_error(message: String) -> JsonRpcResponse {
    JsonRpcResponse::error(
        Value::Null,
        ErrorData::new(ErrorCode::PARSE_ERROR, message, None),
    )
}

/// Decode one already-parsed message.
pub fn parse_value(value: Value) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let id = match &value {
        Value::Object(map) => map.get("id").cloned().unwrap_or(Value::Null),
        Value::Array(_) => {
            return Err(invalid_request(
                Value::Null,
                "Batch requests are not supported",
            ));
        }
        _ => return Err(invalid_request(Value::Null, "Request must be a JSON object")),
    };

    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| invalid_request(id.clone(), format!("Invalid request: {e}")))?;
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(invalid_request(id, "jsonrpc must be \"2.0\""));
    }
    Ok(request)
}

fn invalid_request(id: Value, message: impl Into<String>) -> JsonRpcResponse {
    JsonRpcResponse::error(
        id,
        ErrorData::new(ErrorCode::INVALID_REQUEST, message.into(), None),
    )
}
