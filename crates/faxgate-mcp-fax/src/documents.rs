//! Recipient validation and document loading for `send_fax`.
//!
//! A document comes from exactly one channel, chosen in priority order:
//! local path, then URL, then inline base64. Lower-priority inputs are
//! ignored when a higher one is present.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use faxgate_client::{DocumentFetcher, DocumentKind, FaxDocument, FetchedDocument};
use faxgate_mcp::model::ErrorData;
use regex::Regex;

static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[\d\s\-()]{7,20}$").expect("Invalid phone number regex")
});

/// Strip whitespace from a recipient number and check its format.
pub fn normalize_recipient(to: &str) -> Result<String, ErrorData> {
    let compact: String = to.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ErrorData::invalid_params("Missing required parameter: to", None));
    }
    if !PHONE_NUMBER.is_match(&compact) {
        return Err(ErrorData::invalid_params("Invalid recipient number format", None));
    }
    Ok(compact)
}

/// Where the document to send comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentSource {
    /// Local file, absolute or relative to the base directory.
    Path(String),
    /// `http(s)` URL.
    Url(String),
    /// Base64 content with a file name and optional `pdf`/`txt` override.
    Inline {
        /// Base64 body.
        content: Option<String>,
        /// File name, also used to infer the type.
        file_name: Option<String>,
        /// Explicit type.
        file_type: Option<String>,
    },
}

impl DocumentSource {
    /// Pick the highest-priority channel that was supplied.
    pub fn select(
        file_path: Option<String>,
        file_url: Option<String>,
        file_content: Option<String>,
        file_name: Option<String>,
        file_type: Option<String>,
    ) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(path) = present(file_path) {
            DocumentSource::Path(path)
        } else if let Some(url) = present(file_url) {
            DocumentSource::Url(url)
        } else {
            DocumentSource::Inline {
                content: present(file_content),
                file_name: present(file_name),
                file_type: present(file_type),
            }
        }
    }
}

/// Loads documents from any [`DocumentSource`].
#[derive(Clone, Debug, Default)]
pub struct DocumentLoader {
    fetcher: DocumentFetcher,
    base_dir: Option<PathBuf>,
}

impl DocumentLoader {
    /// Loader using `fetcher` for URLs and the working directory for paths.
    pub fn new(fetcher: DocumentFetcher) -> Self {
        Self {
            fetcher,
            base_dir: None,
        }
    }

    /// Resolve relative paths against `dir` instead of the working directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Load the document.
    pub async fn load(&self, source: DocumentSource) -> Result<FaxDocument, ErrorData> {
        match source {
            DocumentSource::Path(path) => self.load_path(&path).await,
            DocumentSource::Url(url) => self.load_url(&url).await,
            DocumentSource::Inline {
                content,
                file_name,
                file_type,
            } => decode_inline(content, file_name, file_type),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        let joined = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        std::path::absolute(&joined).unwrap_or(joined)
    }

    async fn load_path(&self, path: &str) -> Result<FaxDocument, ErrorData> {
        let resolved = self.resolve(path);
        let not_found = || {
            ErrorData::invalid_params(
                format!("File not found or not a file: {}", resolved.display()),
                None,
            )
        };
        let metadata = tokio::fs::metadata(&resolved).await.map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        let kind = resolved
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentKind::from_extension)
            .ok_or_else(|| {
                ErrorData::invalid_params("filePath must point to a PDF or TXT file", None)
            })?;
        let bytes = tokio::fs::read(&resolved).await.map_err(|e| {
            ErrorData::internal_error(format!("Failed to read {}: {e}", resolved.display()), None)
        })?;
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        log::debug!("Loaded {} ({} bytes)", resolved.display(), bytes.len());
        Ok(FaxDocument::new(bytes, kind, file_name))
    }

    async fn load_url(&self, url: &str) -> Result<FaxDocument, ErrorData> {
        let fetch_failed =
            |reason: String| ErrorData::invalid_params(format!("Failed to fetch fileUrl: {reason}"), None);
        let fetched = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        classify_fetched(fetched).map_err(fetch_failed)
    }
}

/// Decide the kind of a downloaded document from its content type, falling
/// back to the URL's file name.
pub fn classify_fetched(fetched: FetchedDocument) -> Result<FaxDocument, String> {
    let ct = fetched.content_type.as_str();
    let name = fetched.file_name.unwrap_or_else(|| {
        if ct.contains("pdf") {
            DocumentKind::Pdf.default_file_name().to_string()
        } else {
            DocumentKind::Text.default_file_name().to_string()
        }
    });
    let by_name = DocumentKind::from_file_name(&name);

    let kind = if ct.contains("pdf") || by_name == Some(DocumentKind::Pdf) {
        DocumentKind::Pdf
    } else if ct.contains("text/plain") || by_name == Some(DocumentKind::Text) {
        DocumentKind::Text
    } else {
        return Err("Unsupported content-type for fileUrl (expect PDF or text/plain)".to_string());
    };
    if fetched.bytes.is_empty() {
        return Err("downloaded file is empty".to_string());
    }
    Ok(FaxDocument::new(fetched.bytes, kind, Some(name)))
}

/// Decode an inline base64 document.
pub fn decode_inline(
    content: Option<String>,
    file_name: Option<String>,
    file_type: Option<String>,
) -> Result<FaxDocument, ErrorData> {
    let (Some(content), Some(file_name)) = (content, file_name) else {
        return Err(ErrorData::invalid_params(
            "Missing required parameters: fileContent and fileName (or provide filePath)",
            None,
        ));
    };

    let kind = match file_type {
        Some(t) => DocumentKind::from_extension(&t),
        None => DocumentKind::from_file_name(&file_name),
    }
    .ok_or_else(|| ErrorData::invalid_params("fileType must be either \"pdf\" or \"txt\"", None))?;

    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ErrorData::invalid_params("Invalid base64 encoded file content", None))?;
    if bytes.is_empty() {
        return Err(ErrorData::invalid_params("File content is empty", None));
    }
    Ok(FaxDocument::new(bytes, kind, Some(file_name)))
}
