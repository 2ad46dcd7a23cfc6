//! Download of documents referenced by URL.

use std::time::Duration;

use reqwest::Url;

use crate::client::{check_status, content_type};
use crate::error::{Error, Result};

/// A downloaded document and the metadata needed to classify it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` header, lowercased. Empty when absent.
    pub content_type: String,
    /// Last path segment of the URL, if any.
    pub file_name: Option<String>,
}

/// Largest document a fetcher downloads unless told otherwise.
pub const DEFAULT_MAX_FETCH_BYTES: usize = 16 * 1024 * 1024;

/// Fetches `http(s)` documents with a bounded timeout and body size.
#[derive(Clone, Debug)]
pub struct DocumentFetcher {
    http: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl DocumentFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
            max_bytes: DEFAULT_MAX_FETCH_BYTES,
        }
    }

    /// Refuse bodies larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// GET `url` and return its body.
    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let url = Url::parse(url).map_err(|e| Error::Url(format!("{url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Url(format!(
                "unsupported scheme '{}' (expected http or https)",
                url.scheme()
            )));
        }
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        log::debug!("Fetching document from {url}");
        let resp = self.http.get(url).timeout(self.timeout).send().await?;
        let mut resp = check_status(resp).await?;
        let content_type = content_type(&resp).unwrap_or_default().to_ascii_lowercase();
        let too_large = Error::TooLarge {
            limit: self.max_bytes,
        };
        if resp
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(too_large);
        }

        // Content-Length may be absent or wrong, so count as chunks arrive.
        let mut bytes = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(too_large);
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(FetchedDocument {
            bytes,
            content_type,
            file_name,
        })
    }
}

impl Default for DocumentFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
