//! Tool registry trait for MCP servers.
//!
//! This module defines the `ToolRegistry` trait that abstracts over
//! tool registration and dispatch. Native tools and the plugin adapter
//! both implement it.
//!
//! The `CompositeRegistry` combines multiple registries into one and
//! refuses to start when two of them expose the same tool name.

use crate::error::{Error, Result};
use crate::model::{CallToolResult, ErrorData, Tool};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

/// Type alias for async tool handler results.
pub type ToolResult = Pin<Box<dyn Future<Output = std::result::Result<CallToolResult, ErrorData>> + Send>>;

/// Trait for registering and dispatching MCP tools.
///
/// # Example
///
/// ```rust,ignore
/// struct MyTools { /* ... */ }
///
/// impl ToolRegistry for MyTools {
///     fn tools(&self) -> Vec<Tool> {
///         vec![/* tool definitions */]
///     }
///
///     fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
///         match name {
///             "my_tool" => Some(Box::pin(self.handle_my_tool(args))),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait ToolRegistry: Send + Sync {
    /// Returns information about all available tools.
    fn tools(&self) -> Vec<Tool>;

    /// Dispatches a tool call by name.
    ///
    /// Returns `None` if the tool is not recognized by this registry.
    fn call(&self, name: &str, args: Value) -> Option<ToolResult>;

    /// Returns the number of registered tools.
    fn tool_count(&self) -> usize {
        self.tools().len()
    }

    /// Check if a tool exists by name.
    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }

    /// Definition of a tool by name.
    fn tool(&self, name: &str) -> Option<Tool> {
        self.tools().into_iter().find(|t| t.name == name)
    }
}

/// A registry that combines multiple sub-registries.
///
/// # Example
///
/// ```rust,ignore
/// let registry = CompositeRegistry::new()
///     .add(fax_tools)?
///     .add(plugins)?;
///
/// assert_eq!(registry.tool_count(), 6);
/// ```
pub struct CompositeRegistry {
    registries: Vec<Box<dyn ToolRegistry>>,
    names: HashSet<String>,
}

impl CompositeRegistry {
    /// Create a new empty composite registry.
    pub fn new() -> Self {
        Self {
            registries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add a sub-registry.
    ///
    /// Fails if any of its tools collides with a name already registered.
    #[allow(clippy::should_implement_trait)]
    pub fn add<R: ToolRegistry + 'static>(mut self, registry: R) -> Result<Self> {
        let mut incoming = HashSet::new();
        for tool in registry.tools() {
            let name = tool.name.to_string();
            if self.names.contains(&name) || !incoming.insert(name.clone()) {
                return Err(Error::DuplicateTool(name));
            }
        }
        self.names.extend(incoming);
        self.registries.push(Box::new(registry));
        Ok(self)
    }
}

impl Default for CompositeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry for CompositeRegistry {
    fn tools(&self) -> Vec<Tool> {
        self.registries.iter().flat_map(|r| r.tools()).collect()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        for registry in &self.registries {
            if let Some(result) = registry.call(name, args.clone()) {
                return Some(result);
            }
        }
        None
    }

    fn has_tool(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Check that every property listed in the tool's `required` schema entry
/// is present in `args`.
pub fn check_required(tool: &Tool, args: &Value) -> std::result::Result<(), ErrorData> {
    let Some(required) = tool.input_schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };
    for param in required.iter().filter_map(Value::as_str) {
        let present = args.get(param).is_some_and(|v| !v.is_null());
        if !present {
            return Err(ErrorData::invalid_params(
                format!("Missing required parameter: {param}"),
                None,
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Content, ErrorCode, first_text, make_tool};
    use serde_json::json;

    struct TestRegistry {
        tool_list: Vec<Tool>,
    }

    impl TestRegistry {
        fn with(names: &[&str]) -> Self {
            Self {
                tool_list: names
                    .iter()
                    .map(|n| make_tool(n, "Test tool", json!({"type": "object"})))
                    .collect(),
            }
        }
    }

    impl ToolRegistry for TestRegistry {
        fn tools(&self) -> Vec<Tool> {
            self.tool_list.clone()
        }

        fn call(&self, name: &str, _args: Value) -> Option<ToolResult> {
            if self.has_tool(name) {
                let name = name.to_string();
                Some(Box::pin(async move {
                    Ok(CallToolResult::success(vec![Content::text(format!(
                        "called: {name}"
                    ))]))
                }))
            } else {
                None
            }
        }
    }

    #[test]
    fn test_tool_count() {
        let registry = TestRegistry::with(&["tool1", "tool2"]);
        assert_eq!(registry.tool_count(), 2);
    }

    #[test]
    fn test_has_tool() {
        let registry = TestRegistry::with(&["exists"]);
        assert!(registry.has_tool("exists"));
        assert!(!registry.has_tool("missing"));
        assert!(registry.tool("exists").is_some());
    }

    #[tokio::test]
    async fn test_call_known_tool() {
        let registry = TestRegistry::with(&["greet"]);
        let result = registry.call("greet", json!({})).unwrap().await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(first_text(&result), Some("called: greet"));
    }

    #[test]
    fn test_call_unknown_tool() {
        let registry = TestRegistry::with(&["greet"]);
        assert!(registry.call("missing", json!({})).is_none());
    }

    #[test]
    fn test_composite_registry_empty() {
        let composite = CompositeRegistry::new();
        assert_eq!(composite.tool_count(), 0);
        assert!(!composite.has_tool("anything"));
    }

    #[tokio::test]
    async fn test_composite_registry_dispatches() {
        let composite = CompositeRegistry::new()
            .add(TestRegistry::with(&["send"]))
            .unwrap()
            .add(TestRegistry::with(&["status"]))
            .unwrap();

        assert_eq!(composite.tool_count(), 2);
        let result = composite.call("status", json!({})).unwrap().await.unwrap();
        assert_eq!(first_text(&result), Some("called: status"));
        assert!(composite.call("missing", json!({})).is_none());
    }

    #[test]
    fn test_composite_rejects_duplicates_across_registries() {
        let err = CompositeRegistry::new()
            .add(TestRegistry::with(&["send_fax"]))
            .unwrap()
            .add(TestRegistry::with(&["send_fax"]))
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateTool(name) if name == "send_fax"));
    }

    #[test]
    fn test_composite_rejects_duplicates_within_registry() {
        let result = CompositeRegistry::new().add(TestRegistry::with(&["a", "a"]));
        assert!(matches!(result, Err(Error::DuplicateTool(_))));
    }

    #[test]
    fn test_every_listed_tool_is_callable() {
        let composite = CompositeRegistry::new()
            .add(TestRegistry::with(&["a", "b"]))
            .unwrap()
            .add(TestRegistry::with(&["c"]))
            .unwrap();
        for tool in composite.tools() {
            assert!(composite.call(&tool.name, json!({})).is_some(), "{}", tool.name);
        }
    }

    #[test]
    fn test_check_required() {
        let tool = make_tool(
            "send_fax",
            "Send",
            json!({"type": "object", "required": ["to"]}),
        );
        assert!(check_required(&tool, &json!({"to": "+15551234567"})).is_ok());

        let err = check_required(&tool, &json!({})).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Missing required parameter: to");

        assert!(check_required(&tool, &json!({"to": null})).is_err());
    }

    #[test]
    fn test_check_required_without_schema_list() {
        let tool = make_tool("ping", "Ping", json!({"type": "object"}));
        assert!(check_required(&tool, &json!({})).is_ok());
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn ToolRegistry) {}
    }
}
