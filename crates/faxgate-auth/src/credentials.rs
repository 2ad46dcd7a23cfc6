//! Credential extraction from HTTP requests.

use std::collections::HashMap;
use std::fmt;

use axum::extract::Query;
use http::{HeaderMap, Uri, header};

/// Header carrying a shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying a shared key (WebSocket clients cannot always
/// set headers).
pub const KEY_QUERY_PARAM: &str = "key";

/// Credentials presented with a request.
///
/// `Debug` output never includes the secret values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Token from `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
    /// Value of the `X-API-Key` header.
    pub api_key: Option<String>,
    /// Value of the `key` query parameter.
    pub query_key: Option<String>,
}

impl Credentials {
    /// Extract from request parts.
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self::from_headers_and_uri(&parts.headers, &parts.uri)
    }

    /// Extract from a full request.
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        Self::from_headers_and_uri(req.headers(), req.uri())
    }

    /// Extract from headers and URI.
    pub fn from_headers_and_uri(headers: &HeaderMap, uri: &Uri) -> Self {
        Self {
            bearer: extract_bearer_token(headers).map(str::to_string),
            api_key: header_value(headers, API_KEY_HEADER),
            query_key: query_value(uri, KEY_QUERY_PARAM),
        }
    }

    /// Whether no credential of any kind was presented.
    pub fn is_empty(&self) -> bool {
        self.bearer.is_none() && self.api_key.is_none() && self.query_key.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("bearer", &mask(&self.bearer))
            .field("api_key", &mask(&self.api_key))
            .field("query_key", &mask(&self.query_key))
            .finish()
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn query_value(uri: &Uri, name: &str) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.get(name).filter(|v| !v.is_empty()).cloned()
}
