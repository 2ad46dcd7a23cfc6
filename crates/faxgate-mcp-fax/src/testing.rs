//! Hand-written fax API mock shared by the crate's tests.

use std::sync::Mutex;

use async_trait::async_trait;
use faxgate_client::{Error, FaxApi, FaxDocument, FaxJob, InboundFax, InboundPdf, Result};
use serde_json::{Map, Value, json};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n";

#[derive(Default)]
pub struct MockFaxApi {
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, FaxDocument)>>,
    fail_status: Option<u16>,
}

impl MockFaxApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with this upstream status.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(String, FaxDocument)> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.fail_status {
            Some(status) => Err(Error::Status {
                status,
                message: "mock failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn job(id: &str, status: &str) -> FaxJob {
    FaxJob {
        id: id.to_string(),
        status: Some(status.to_string()),
        to: Some("+15551234567".to_string()),
        pages: Some(1),
        created_at: None,
        updated_at: None,
        error: None,
        extra: Map::new(),
    }
}

#[async_trait]
impl FaxApi for MockFaxApi {
    async fn send_fax(&self, to: &str, document: FaxDocument) -> Result<FaxJob> {
        self.record(format!("send_fax:{to}"))?;
        self.sent.lock().unwrap().push((to.to_string(), document));
        Ok(job("fbj_new", "queued"))
    }

    async fn get_fax_status(&self, job_id: &str) -> Result<FaxJob> {
        self.record(format!("get_fax_status:{job_id}"))?;
        Ok(job(job_id, "SUCCESS"))
    }

    async fn list_inbound(&self, limit: Option<u32>, cursor: Option<&str>) -> Result<Value> {
        self.record(format!(
            "list_inbound:{}:{}",
            limit.map(|l| l.to_string()).unwrap_or_default(),
            cursor.unwrap_or_default()
        ))?;
        Ok(json!({
            "items": [
                {"id": "in_1", "fr": "+15550001111", "to": "+15552223333", "pages": 2},
                {"id": "in_2", "from": "+15554445555"}
            ]
        }))
    }

    async fn get_inbound(&self, inbound_id: &str) -> Result<InboundFax> {
        self.record(format!("get_inbound:{inbound_id}"))?;
        Ok(InboundFax {
            id: inbound_id.to_string(),
            from: Some("+15550001111".to_string()),
            to: Some("+15552223333".to_string()),
            pages: Some(3),
            received_at: Some("2025-01-02T03:04:05Z".to_string()),
        })
    }

    async fn download_inbound_pdf(&self, inbound_id: &str) -> Result<InboundPdf> {
        self.record(format!("download_inbound_pdf:{inbound_id}"))?;
        Ok(InboundPdf {
            bytes: PDF_BYTES.to_vec(),
            content_type: "application/pdf".to_string(),
        })
    }
}
