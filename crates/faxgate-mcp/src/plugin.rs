//! Plugin adapter.
//!
//! Plugins contribute tools under their manifest id: a plugin `status`
//! exposing `check_fax_status` is listed as `status_check_fax_status`.
//! Whatever a plugin returns is rendered as pretty JSON; a plugin failure
//! becomes a tool result with `isError` set rather than a protocol error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{CallToolResult, Content, Tool, make_tool};
use crate::registry::{ToolRegistry, ToolResult};

/// Identity of a plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Namespace prefix for the plugin's tools.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Plugin version.
    pub version: String,
    /// Capability tags, e.g. `mcp`.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// A tool as declared by a plugin, before qualification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginTool {
    /// Unqualified name.
    pub name: String,
    /// Description shown to callers.
    pub description: Option<String>,
    /// JSON schema of the parameters.
    pub parameters: Value,
}

/// Uniform shape every extension implements.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin identity.
    fn manifest(&self) -> PluginManifest;

    /// Tools contributed by this plugin.
    fn list_tools(&self) -> Vec<PluginTool>;

    /// Run one of this plugin's tools by its unqualified name.
    async fn execute(&self, tool_name: &str, params: Value) -> anyhow::Result<Value>;
}

struct Entry {
    plugin: Arc<dyn Plugin>,
    tool_name: String,
    definition: Tool,
}

/// [`ToolRegistry`] over registered plugins.
#[derive(Default)]
pub struct PluginRegistry {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    plugins: Vec<PluginManifest>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin and qualify its tools with its id.
    ///
    /// Nothing is registered if any qualified name is already taken.
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) -> Result<()> {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        let manifest = plugin.manifest();
        if manifest.id.is_empty() {
            return Err(Error::invalid_plugin(&manifest.name, "manifest id is empty"));
        }

        let mut staged = Vec::new();
        for tool in plugin.list_tools() {
            let qualified = format!("{}_{}", manifest.id, tool.name);
            if self.entries.contains_key(&qualified)
                || staged.iter().any(|(name, _): &(String, Entry)| *name == qualified)
            {
                return Err(Error::DuplicateTool(qualified));
            }
            let schema = match tool.parameters {
                Value::Object(_) => tool.parameters,
                _ => serde_json::json!({"type": "object"}),
            };
            let description = tool.description.as_deref().unwrap_or("Plugin tool");
            let definition = make_tool(&qualified, description, schema);
            staged.push((
                qualified,
                Entry {
                    plugin: Arc::clone(&plugin),
                    tool_name: tool.name,
                    definition,
                },
            ));
        }

        log::info!(
            "Registered plugin '{}' v{} ({} tools)",
            manifest.id,
            manifest.version,
            staged.len()
        );
        for (name, entry) in staged {
            self.order.push(name.clone());
            self.entries.insert(name, entry);
        }
        self.plugins.push(manifest);
        Ok(())
    }

    /// Manifests of registered plugins.
    pub fn manifests(&self) -> &[PluginManifest] {
        &self.plugins
    }
}

impl ToolRegistry for PluginRegistry {
    fn tools(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|e| e.definition.clone())
            .collect()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let entry = self.entries.get(name)?;
        let plugin = Arc::clone(&entry.plugin);
        let tool_name = entry.tool_name.clone();
        let qualified = name.to_string();

        Some(Box::pin(async move {
            match plugin.execute(&tool_name, args).await {
                Ok(value) => {
                    let text = serde_json::to_string_pretty(&value)
                        .unwrap_or_else(|_| value.to_string());
                    Ok(CallToolResult::success(vec![Content::text(text)]))
                }
                Err(e) => {
                    log::warn!("Plugin tool {qualified} failed: {e:#}");
                    Ok(CallToolResult::error(vec![Content::text(format!(
                        "Error: {e}"
                    ))]))
                }
            }
        }))
    }

    fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
