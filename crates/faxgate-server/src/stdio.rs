//! Line-delimited JSON-RPC over stdin/stdout.
//!
//! One implicit session, no authentication. Requests are answered in
//! arrival order, one line per response. Logs go to stderr so stdout stays
//! protocol-clean.

use async_trait::async_trait;
use faxgate_mcp::McpServer;
use faxgate_mcp::jsonrpc::parse_bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::session::{SessionGuard, SessionManager, TransportKind};
use crate::transport::Transport;

/// The stdio transport.
pub struct StdioTransport {
    sessions: SessionManager,
}

impl StdioTransport {
    /// Transport serving `server`.
    pub fn new(server: McpServer) -> Self {
        Self {
            sessions: SessionManager::new(server, TransportKind::Stdio),
        }
    }

    /// Serve one session over `reader`/`writer` until `reader` ends.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let session = self.sessions.create();
        let _guard = SessionGuard::new(self.sessions.clone(), &session);
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            // Bytes, not str: a line that is not UTF-8 gets a parse error
            // like any other malformed frame.
            let response = match parse_bytes(line) {
                Ok(request) => session.core().handle(request).await,
                Err(error) => {
                    log::warn!(
                        "Rejected stdio message: {}",
                        String::from_utf8_lossy(line)
                    );
                    Some(error)
                }
            };

            if let Some(response) = response {
                writer.write_all(response.to_json().as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        log::info!("stdin closed, ending stdio session");
        Ok(())
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    async fn serve(self: Box<Self>) -> Result<()> {
        log::info!("faxgate stdio transport ready");
        let (stdin, stdout) = rmcp::transport::stdio();
        self.run(stdin, stdout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::test_server;
    use serde_json::{Value, json};

    async fn run_lines(input: &str) -> Vec<Value> {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> Vec<Value> {
        let transport = StdioTransport::new(test_server());
        let mut output = Vec::new();
        transport.run(input, &mut output).await.unwrap();
        assert!(transport.sessions.is_empty());
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_responses_in_request_order() {
        let input = [
            json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}),
            json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/list"}),
            json!({"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}),
        ]
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");

        let out = run_lines(&input).await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["id"], 1);
        assert_eq!(out[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(out[1]["id"], 2);
        assert_eq!(out[1]["result"]["tools"][0]["name"], "echo");
        assert_eq!(out[2]["id"], 3);
        assert_eq!(out[2]["result"]["content"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn test_parse_error_keeps_loop_alive() {
        let input = "{not json\n\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n";
        let out = run_lines(input).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["error"]["code"], -32700);
        assert_eq!(out[0]["id"], Value::Null);
        assert_eq!(out[1]["id"], 7);
        assert_eq!(out[1]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let input = json!({"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"nope"}}).to_string();
        let out = run_lines(&input).await;
        assert_eq!(out[0]["error"]["message"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_parse_error() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":8,\"method\":\"ping\"}\r\n");
        let out = run_bytes(&input).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["error"]["code"], -32700);
        assert_eq!(out[0]["id"], Value::Null);
        assert_eq!(out[1]["id"], 8);
        assert_eq!(out[1]["result"], json!({}));
    }
}
