//! Inbound fax PDFs as resources.
//!
//! `get_inbound_pdf` answers with `faxgate:inbound/<id>/pdf`; reading that
//! URI downloads the PDF and returns it base64-encoded.

use std::sync::{Arc, LazyLock};

use faxgate_client::FaxApi;
use faxgate_mcp::model::{
    AnnotateAble, PDF_MIME_TYPE, RawResourceTemplate, ReadResourceResult, ResourceTemplate,
    blob_contents,
};
use faxgate_mcp::resources::{ResourceFuture, ResourceRegistry};
use regex::Regex;

use crate::errors::lookup_error;

/// URI scheme of faxgate resources.
pub const SCHEME: &str = "faxgate";

static INBOUND_PDF_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^faxgate:inbound/(.+)/pdf$").expect("Invalid inbound PDF URI regex")
});

/// Resource URI of an inbound fax PDF.
pub fn inbound_pdf_uri(inbound_id: &str) -> String {
    format!("{SCHEME}:inbound/{inbound_id}/pdf")
}

/// Inbound id referenced by a PDF resource URI.
pub fn parse_inbound_pdf_uri(uri: &str) -> Option<&str> {
    INBOUND_PDF_URI
        .captures(uri)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// [`ResourceRegistry`] serving inbound fax PDFs.
pub struct InboundResources {
    api: Arc<dyn FaxApi>,
}

impl InboundResources {
    /// Serve PDFs from `api`.
    pub fn new(api: Arc<dyn FaxApi>) -> Self {
        Self { api }
    }
}

impl ResourceRegistry for InboundResources {
    fn templates(&self) -> Vec<ResourceTemplate> {
        vec![
            RawResourceTemplate::new(format!("{SCHEME}:inbound/{{id}}/pdf"), "inbound-fax-pdf")
                .with_description("PDF of an inbound fax")
                .with_mime_type(PDF_MIME_TYPE)
                .no_annotation(),
        ]
    }

    fn read(&self, uri: &str) -> Option<ResourceFuture> {
        let inbound_id = parse_inbound_pdf_uri(uri)?.to_string();
        let api = Arc::clone(&self.api);
        let uri = uri.to_string();

        Some(Box::pin(async move {
            let pdf = api
                .download_inbound_pdf(&inbound_id)
                .await
                .map_err(|e| lookup_error(&e, || format!("Inbound fax not found: {inbound_id}")))?;
            Ok(ReadResourceResult::new(vec![blob_contents(
                uri,
                pdf.content_type,
                &pdf.bytes,
            )]))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFaxApi, PDF_BYTES};
    use faxgate_mcp::model::{ErrorCode, ResourceContents, contents_bytes};

    #[test]
    fn test_uri_roundtrip() {
        let uri = inbound_pdf_uri("in_abc");
        assert_eq!(uri, "faxgate:inbound/in_abc/pdf");
        assert_eq!(parse_inbound_pdf_uri(&uri), Some("in_abc"));
    }

    #[test]
    fn test_uri_case_insensitive() {
        assert_eq!(parse_inbound_pdf_uri("FAXGATE:Inbound/in_1/PDF"), Some("in_1"));
    }

    #[test]
    fn test_foreign_uri_not_handled() {
        let resources = InboundResources::new(Arc::new(MockFaxApi::new()));
        assert!(resources.read("faxgate:outbound/fbj_1/pdf").is_none());
        assert!(resources.read("file:///tmp/x.pdf").is_none());
    }

    #[tokio::test]
    async fn test_read_downloads_pdf() {
        let api = Arc::new(MockFaxApi::new());
        let resources = InboundResources::new(api.clone());

        let result = resources
            .read("faxgate:inbound/in_7/pdf")
            .unwrap()
            .await
            .unwrap();
        let contents = &result.contents[0];
        let ResourceContents::BlobResourceContents { uri, mime_type, .. } = contents else {
            panic!("expected blob contents, got {contents:?}");
        };
        assert_eq!(uri, "faxgate:inbound/in_7/pdf");
        assert_eq!(mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(contents_bytes(contents).unwrap(), PDF_BYTES);
        assert_eq!(api.calls(), vec!["download_inbound_pdf:in_7"]);
    }

    #[tokio::test]
    async fn test_read_missing_fax() {
        let resources = InboundResources::new(Arc::new(MockFaxApi::failing(404)));
        let err = resources
            .read("faxgate:inbound/in_404/pdf")
            .unwrap()
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Inbound fax not found: in_404");
    }

    #[test]
    fn test_template_advertised() {
        let resources = InboundResources::new(Arc::new(MockFaxApi::new()));
        let templates = resources.templates();
        assert_eq!(templates[0].uri_template, "faxgate:inbound/{id}/pdf");
    }
}
