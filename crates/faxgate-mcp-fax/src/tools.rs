//! MCP tools for the fax API.
//!
//! Provides `FaxTools` that implements `ToolRegistry` by delegating to a
//! `faxgate_client::FaxApi`.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use faxgate_client::{DocumentFetcher, FaxApi, FaxJob, InboundFax};
use faxgate_mcp::model::{
    CallToolResult, Content, ErrorData, PDF_MIME_TYPE, Tool, make_tool, resource_link,
};
use faxgate_mcp::registry::{ToolRegistry, ToolResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::documents::{DocumentLoader, DocumentSource, normalize_recipient};
use crate::errors::{lookup_error, send_error, upstream_error};
use crate::ids::FaxIdKind;
use crate::resources::inbound_pdf_uri;

/// Default page size of `list_inbound`.
pub const DEFAULT_INBOUND_LIMIT: u32 = 20;

// ---------------------------------------------------------------------------
// Argument types
// ---------------------------------------------------------------------------

/// Arguments for `send_fax`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFaxArgs {
    /// Recipient number.
    pub to: Option<String>,
    /// Local PDF/TXT path (preferred).
    pub file_path: Option<String>,
    /// URL of a PDF/TXT document.
    pub file_url: Option<String>,
    /// Base64 document body.
    pub file_content: Option<String>,
    /// File name of the inline document.
    pub file_name: Option<String>,
    /// `pdf` or `txt` override for inline documents.
    pub file_type: Option<String>,
}

/// Arguments for `get_fax_status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFaxStatusArgs {
    /// Job id from `send_fax`.
    pub job_id: String,
}

/// Arguments for `get_fax`.
#[derive(Debug, Deserialize)]
pub struct GetFaxArgs {
    /// Outbound job id or inbound id.
    pub id: String,
}

/// Arguments for `list_inbound`.
#[derive(Debug, Default, Deserialize)]
pub struct ListInboundArgs {
    /// Maximum items (default 20).
    pub limit: Option<u32>,
    /// Pagination cursor.
    pub cursor: Option<String>,
}

/// Arguments for `get_inbound_pdf`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInboundPdfArgs {
    /// Inbound fax id.
    pub inbound_id: String,
    /// Return the PDF inline instead of as a resource reference.
    #[serde(default)]
    pub as_base64: bool,
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ErrorData> {
    serde_json::from_value(args).map_err(|e| ErrorData::invalid_params(e.to_string(), None))
}

fn non_empty(value: String, name: &str) -> Result<String, ErrorData> {
    if value.trim().is_empty() {
        Err(ErrorData::invalid_params(format!("{name} is required"), None))
    } else {
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// FaxTools
// ---------------------------------------------------------------------------

/// MCP tools for the fax API.
///
/// Generates five tools:
/// - `send_fax`
/// - `get_fax_status`
/// - `get_fax`
/// - `list_inbound`
/// - `get_inbound_pdf`
///
/// # Example
///
/// ```rust,ignore
/// let api: Arc<dyn FaxApi> = Arc::new(FaxClient::new(&config.fax_api)?);
/// let tools = FaxTools::new(api)
///     .with_fetcher(DocumentFetcher::new(Duration::from_secs(30)));
/// ```
#[derive(Clone)]
pub struct FaxTools {
    api: Arc<dyn FaxApi>,
    loader: DocumentLoader,
}

impl FaxTools {
    /// Create fax tools over an API client.
    pub fn new(api: Arc<dyn FaxApi>) -> Self {
        Self {
            api,
            loader: DocumentLoader::default(),
        }
    }

    /// Use `fetcher` for `fileUrl` downloads.
    pub fn with_fetcher(mut self, fetcher: DocumentFetcher) -> Self {
        self.loader = DocumentLoader::new(fetcher);
        self
    }

    /// Resolve relative `filePath` values against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.loader = self.loader.with_base_dir(dir);
        self
    }

    async fn send_fax(self, args: SendFaxArgs) -> Result<CallToolResult, ErrorData> {
        let to = normalize_recipient(args.to.as_deref().unwrap_or_default())?;
        let source = DocumentSource::select(
            args.file_path,
            args.file_url,
            args.file_content,
            args.file_name,
            args.file_type,
        );
        let document = self.loader.load(source).await?;

        log::info!(
            "Sending fax ({} bytes, {})",
            document.bytes.len(),
            document.kind.mime_type()
        );
        let job = self
            .api
            .send_fax(&to, document)
            .await
            .map_err(|e| send_error(&e))?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Fax queued. Job ID: {}",
            job.id
        ))]))
    }

    async fn get_fax_status(self, args: GetFaxStatusArgs) -> Result<CallToolResult, ErrorData> {
        let job_id = non_empty(args.job_id, "jobId")?;
        let job = self
            .api
            .get_fax_status(&job_id)
            .await
            .map_err(|e| lookup_error(&e, || format!("Fax job not found: {job_id}")))?;
        Ok(CallToolResult::success(vec![Content::text(format_job_status(&job))]))
    }

    async fn get_fax(self, args: GetFaxArgs) -> Result<CallToolResult, ErrorData> {
        let id = non_empty(args.id, "id")?;
        let not_found = || format!("Fax not found: {id}");

        let kind = FaxIdKind::classify(&id);
        if kind.is_inbound() {
            let fax = self
                .api
                .get_inbound(&id)
                .await
                .map_err(|e| lookup_error(&e, not_found))?;
            let data = json!({
                "type": "inbound",
                "id": fax.id,
                "from": fax.from,
                "to": fax.to,
                "pages": fax.pages,
                "received_at": fax.received_at,
            });
            return Ok(CallToolResult::success(vec![
                Content::text(format_inbound(&fax)),
                Content::text(data.to_string()),
            ]));
        }

        if kind == FaxIdKind::Unknown {
            log::debug!("Id {id} has no known prefix; looking it up as an outbound job");
        }
        let job = self
            .api
            .get_fax_status(&id)
            .await
            .map_err(|e| lookup_error(&e, not_found))?;
        let mut data = serde_json::to_value(&job)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        if let Value::Object(map) = &mut data {
            map.insert("type".to_string(), json!("outbound"));
        }
        Ok(CallToolResult::success(vec![
            Content::text(format_outbound(&job)),
            Content::text(data.to_string()),
        ]))
    }

    async fn list_inbound(self, args: ListInboundArgs) -> Result<CallToolResult, ErrorData> {
        let limit = args.limit.unwrap_or(DEFAULT_INBOUND_LIMIT);
        let data = self
            .api
            .list_inbound(Some(limit), args.cursor.as_deref())
            .await
            .map_err(|e| upstream_error(&e))?;

        let summary = match data.get("items").and_then(Value::as_array) {
            Some(items) => items.iter().map(format_inbound_line).collect::<Vec<_>>().join("\n"),
            None => data.to_string(),
        };
        Ok(CallToolResult::success(vec![
            Content::text(format!("Inbound List\n\n{summary}")),
            Content::text(data.to_string()),
        ]))
    }

    async fn get_inbound_pdf(self, args: GetInboundPdfArgs) -> Result<CallToolResult, ErrorData> {
        let inbound_id = non_empty(args.inbound_id, "inboundId")?;
        if !args.as_base64 {
            return Ok(CallToolResult::success(vec![resource_link(
                inbound_pdf_uri(&inbound_id),
                format!("{inbound_id}.pdf"),
                PDF_MIME_TYPE,
            )]));
        }

        let pdf = self
            .api
            .download_inbound_pdf(&inbound_id)
            .await
            .map_err(|e| lookup_error(&e, || format!("Inbound fax not found: {inbound_id}")))?;
        Ok(CallToolResult::success(vec![Content::text(STANDARD.encode(&pdf.bytes))]))
    }
}

impl ToolRegistry for FaxTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool(
                "send_fax",
                "Send a fax to a recipient. Preferred: provide filePath to a local PDF/TXT, or fileUrl. Fallback: base64 fileContent.",
                json!({
                    "type": "object",
                    "properties": {
                        "to": {
                            "type": "string",
                            "description": "Fax number (e.g., +1234567890)"
                        },
                        "filePath": {
                            "type": "string",
                            "description": "Absolute or relative path to PDF or TXT file (preferred)"
                        },
                        "fileUrl": {
                            "type": "string",
                            "description": "HTTP(S) URL to fetch the file from (PDF or TXT)"
                        },
                        "fileContent": {
                            "type": "string",
                            "description": "Base64 encoded file content (PDF or plain text)"
                        },
                        "fileName": {
                            "type": "string",
                            "description": "File name, e.g., document.pdf"
                        },
                        "fileType": {
                            "type": "string",
                            "enum": ["pdf", "txt"],
                            "description": "Optional override of file type"
                        }
                    },
                    "required": ["to"]
                }),
            ),
            make_tool(
                "get_fax_status",
                "Check the status of a previously sent fax job",
                json!({
                    "type": "object",
                    "properties": {
                        "jobId": { "type": "string", "description": "Job ID from send_fax" }
                    },
                    "required": ["jobId"]
                }),
            ),
            make_tool(
                "get_fax",
                "Get fax details by id. Supports outbound jobs (jobId) and inbound ids.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "Outbound job id (e.g., fbj_*) or inbound id (e.g., in_*)"
                        }
                    },
                    "required": ["id"]
                }),
            ),
            make_tool(
                "list_inbound",
                "List recent inbound faxes (metadata only).",
                json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Max items to return (default 20)"
                        },
                        "cursor": {
                            "type": "string",
                            "description": "Cursor token for pagination if supported"
                        }
                    }
                }),
            ),
            make_tool(
                "get_inbound_pdf",
                "Download an inbound fax PDF, either inline as base64 or as a resource URI to read separately.",
                json!({
                    "type": "object",
                    "properties": {
                        "inboundId": { "type": "string", "description": "Inbound fax id" },
                        "asBase64": {
                            "type": "boolean",
                            "default": false,
                            "description": "If true, return base64; otherwise return a resource reference"
                        }
                    },
                    "required": ["inboundId"]
                }),
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let this = self.clone();

        match name {
            "send_fax" => Some(Box::pin(async move {
                this.send_fax(parse_args(args)?).await
            })),
            "get_fax_status" => Some(Box::pin(async move {
                this.get_fax_status(parse_args(args)?).await
            })),
            "get_fax" => Some(Box::pin(async move { this.get_fax(parse_args(args)?).await })),
            "list_inbound" => Some(Box::pin(async move {
                this.list_inbound(parse_args(args)?).await
            })),
            "get_inbound_pdf" => Some(Box::pin(async move {
                this.get_inbound_pdf(parse_args(args)?).await
            })),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn format_job_status(job: &FaxJob) -> String {
    let mut text = String::from("Fax Job Status\n\n");
    let _ = writeln!(text, "Job ID: {}", job.id);
    let _ = writeln!(text, "Status: {}", job.status.as_deref().unwrap_or("unknown"));
    let _ = writeln!(text, "Recipient: {}", job.to.as_deref().unwrap_or("unknown"));
    if let Some(pages) = job.pages {
        let _ = writeln!(text, "Pages: {pages}");
    }
    if let Some(created) = &job.created_at {
        let _ = writeln!(text, "Created: {created}");
    }
    if let Some(updated) = &job.updated_at {
        let _ = writeln!(text, "Updated: {updated}");
    }
    if let Some(error) = &job.error {
        let _ = writeln!(text, "Error: {error}");
    }
    text
}

fn format_outbound(job: &FaxJob) -> String {
    let mut lines = vec![
        "Outbound Fax".to_string(),
        format!("Job ID: {}", job.id),
        format!("Status: {}", job.status.as_deref().unwrap_or("unknown")),
    ];
    if let Some(to) = &job.to {
        lines.push(format!("Recipient: {to}"));
    }
    if let Some(pages) = job.pages {
        lines.push(format!("Pages: {pages}"));
    }
    if let Some(created) = &job.created_at {
        lines.push(format!("Created: {created}"));
    }
    if let Some(updated) = &job.updated_at {
        lines.push(format!("Updated: {updated}"));
    }
    if let Some(error) = &job.error {
        lines.push(format!("Error: {error}"));
    }
    lines.join("\n")
}

fn format_inbound(fax: &InboundFax) -> String {
    let mut lines = vec![
        "Inbound Fax".to_string(),
        format!("ID: {}", fax.id),
        format!("From: {}", fax.from.as_deref().unwrap_or("unknown")),
        format!("To: {}", fax.to.as_deref().unwrap_or("unknown")),
    ];
    if let Some(pages) = fax.pages {
        lines.push(format!("Pages: {pages}"));
    }
    if let Some(received) = &fax.received_at {
        lines.push(format!("Received: {received}"));
    }
    lines.join("\n")
}

fn format_inbound_line(item: &Value) -> String {
    let field = |key: &str| item.get(key).and_then(Value::as_str);
    let id = field("id").unwrap_or("?");
    let from = field("fr").or_else(|| field("from")).unwrap_or("unknown");
    let to = field("to").unwrap_or("unknown");
    match item.get("pages").and_then(Value::as_u64) {
        Some(pages) => format!("• {id} from {from} → {to} ({pages}p)"),
        None => format!("• {id} from {from} → {to}"),
    }
}

// ============================================================================
// Tests
// ============================================================================
