//! Example plugin: fax job status.

use std::sync::Arc;

use async_trait::async_trait;
use faxgate_client::FaxApi;
use faxgate_mcp::plugin::{Plugin, PluginManifest, PluginTool};
use serde_json::{Value, json};

/// Plugin `status` contributing `check_fax_status`.
pub struct StatusPlugin {
    api: Arc<dyn FaxApi>,
}

impl StatusPlugin {
    /// Plugin backed by `api`.
    pub fn new(api: Arc<dyn FaxApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Plugin for StatusPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            id: "status".to_string(),
            name: "Status Tools".to_string(),
            version: "1.0.0".to_string(),
            capabilities: vec!["mcp".to_string()],
        }
    }

    fn list_tools(&self) -> Vec<PluginTool> {
        vec![PluginTool {
            name: "check_fax_status".to_string(),
            description: Some("Check the status of a fax job by jobId".to_string()),
            parameters: json!({
                "type": "object",
                "properties": {
                    "jobId": { "type": "string", "description": "Fax job ID" }
                },
                "required": ["jobId"]
            }),
        }]
    }

    async fn execute(&self, tool_name: &str, params: Value) -> anyhow::Result<Value> {
        match tool_name {
            "check_fax_status" => {
                let job_id = params
                    .get("jobId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow::anyhow!("jobId must be a string"))?;
                let job = self.api.get_fax_status(job_id).await?;
                Ok(serde_json::to_value(job)?)
            }
            other => anyhow::bail!("Unknown tool: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFaxApi;
    use faxgate_mcp::model::first_text;
    use faxgate_mcp::{PluginRegistry, ToolRegistry};

    fn registry(api: Arc<MockFaxApi>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register(StatusPlugin::new(api)).unwrap();
        registry
    }

    #[test]
    fn test_qualified_name() {
        let registry = registry(Arc::new(MockFaxApi::new()));
        assert!(registry.has_tool("status_check_fax_status"));
    }

    #[tokio::test]
    async fn test_returns_job_json() {
        let api = Arc::new(MockFaxApi::new());
        let result = registry(api.clone())
            .call("status_check_fax_status", json!({"jobId": "fbj_5"}))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        let job: Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
        assert_eq!(job["id"], "fbj_5");
        assert_eq!(job["status"], "SUCCESS");
        assert_eq!(api.calls(), vec!["get_fax_status:fbj_5"]);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error_result() {
        let result = registry(Arc::new(MockFaxApi::failing(500)))
            .call("status_check_fax_status", json!({"jobId": "fbj_5"}))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(first_text(&result).unwrap().starts_with("Error: Fax API error (500)"));
    }
}
