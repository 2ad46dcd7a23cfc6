//! Wire types exchanged with the fax API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document format accepted by the fax API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// `application/pdf`
    Pdf,
    /// `text/plain`
    #[serde(rename = "txt")]
    Text,
}

impl DocumentKind {
    /// MIME type sent with the upload.
    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Text => "text/plain",
        }
    }

    /// File name used when the caller supplied none.
    pub fn default_file_name(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "document.pdf",
            DocumentKind::Text => "document.txt",
        }
    }

    /// Infer the kind from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1;
        Self::from_extension(ext)
    }

    /// Map `pdf` / `txt` (case-insensitive) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// A document ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaxDocument {
    /// Raw bytes. Text documents are UTF-8.
    pub bytes: Vec<u8>,
    /// Format of `bytes`.
    pub kind: DocumentKind,
    /// File name reported to the API.
    pub file_name: String,
}

impl FaxDocument {
    /// Build a document, defaulting the file name from the kind.
    pub fn new(bytes: Vec<u8>, kind: DocumentKind, file_name: Option<String>) -> Self {
        let file_name = file_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| kind.default_file_name().to_string());
        Self {
            bytes,
            kind,
            file_name,
        }
    }
}

/// An outbound fax job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaxJob {
    /// Job id.
    pub id: String,
    /// Job status (`queued`, `in_progress`, `SUCCESS`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Recipient number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Page count when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An inbound fax record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundFax {
    /// Inbound id (`in_...`).
    pub id: String,
    /// Sender number. Older API versions call this `fr`.
    #[serde(default, alias = "fr", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Receiving number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Page count when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    /// Receipt timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

/// Binary PDF of an inbound fax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundPdf {
    /// PDF bytes.
    pub bytes: Vec<u8>,
    /// Content type reported by the API, `application/pdf` if absent.
    pub content_type: String,
}
