//! Fax API client.

use std::time::Duration;

use async_trait::async_trait;
use faxgate_core::FaxApiConfig;
use reqwest::{Response, Url, header, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{FaxDocument, FaxJob, InboundFax, InboundPdf};

const API_KEY_HEADER: &str = "X-API-Key";

/// Operations the gateway needs from the fax API.
#[async_trait]
pub trait FaxApi: Send + Sync {
    /// `POST /fax` with multipart `to` + `file`.
    async fn send_fax(&self, to: &str, document: FaxDocument) -> Result<FaxJob>;

    /// `GET /fax/{id}`.
    async fn get_fax_status(&self, job_id: &str) -> Result<FaxJob>;

    /// `GET /inbound?limit&cursor`. The listing is returned as-is.
    async fn list_inbound(&self, limit: Option<u32>, cursor: Option<&str>) -> Result<Value>;

    /// `GET /inbound/{id}`.
    async fn get_inbound(&self, inbound_id: &str) -> Result<InboundFax>;

    /// `GET /inbound/{id}/pdf`.
    async fn download_inbound_pdf(&self, inbound_id: &str) -> Result<InboundPdf>;
}

/// reqwest-backed [`FaxApi`].
#[derive(Clone, Debug)]
pub struct FaxClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    send_timeout: Duration,
    request_timeout: Duration,
}

impl FaxClient {
    /// Create a client from configuration.
    pub fn new(config: &FaxApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Url(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Url(format!(
                "{}: cannot be used as a base URL",
                config.base_url
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            send_timeout: Duration::from_secs(config.send_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether an API key is sent with each request.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url, timeout: Duration) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url).timeout(timeout);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        log::debug!("GET {url}");
        let resp = self
            .request(reqwest::Method::GET, url, self.request_timeout)
            .send()
            .await?;
        decode_json(check_status(resp).await?).await
    }
}

#[async_trait]
impl FaxApi for FaxClient {
    async fn send_fax(&self, to: &str, document: FaxDocument) -> Result<FaxJob> {
        let to: String = to.chars().filter(|c| !c.is_whitespace()).collect();
        let url = self.url(&["fax"])?;
        log::debug!(
            "POST {url} ({} bytes, {})",
            document.bytes.len(),
            document.kind.mime_type()
        );

        let part = multipart::Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str(document.kind.mime_type())?;
        let form = multipart::Form::new().text("to", to).part("file", part);

        let resp = self
            .request(reqwest::Method::POST, url, self.send_timeout)
            .multipart(form)
            .send()
            .await?;
        decode_json(check_status(resp).await?).await
    }

    async fn get_fax_status(&self, job_id: &str) -> Result<FaxJob> {
        let url = self.url(&["fax", job_id])?;
        self.get_json(url).await
    }

    async fn list_inbound(&self, limit: Option<u32>, cursor: Option<&str>) -> Result<Value> {
        let mut url = self.url(&["inbound"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.get_json(url).await
    }

    async fn get_inbound(&self, inbound_id: &str) -> Result<InboundFax> {
        let url = self.url(&["inbound", inbound_id])?;
        self.get_json(url).await
    }

    async fn download_inbound_pdf(&self, inbound_id: &str) -> Result<InboundPdf> {
        let url = self.url(&["inbound", inbound_id, "pdf"])?;
        log::debug!("GET {url}");
        let resp = self
            .request(reqwest::Method::GET, url, self.send_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let content_type = content_type(&resp).unwrap_or_else(|| "application/pdf".to_string());
        let bytes = resp.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(Error::InvalidResponse("empty PDF body".to_string()));
        }
        Ok(InboundPdf {
            bytes,
            content_type,
        })
    }
}

pub(crate) fn content_type(resp: &Response) -> Option<String> {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Turn a non-success response into [`Error::Status`], preferring the
/// body's `detail` field for the message.
pub(crate) async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let reason = status.canonical_reason().unwrap_or("Unknown error").to_string();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(reason);
    log::debug!("Fax API returned {status}: {message}");
    Err(Error::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp.bytes().await?;
    if body.is_empty() {
        return Err(Error::InvalidResponse("empty body".to_string()));
    }
    serde_json::from_slice(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
}
