//! The same calls made over every transport must produce the same payloads.

use axum::Router;
use axum::body::{Body, BodyDataStream};
use faxgate_auth::SharedSecret;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;

use crate::session::tests::test_server;
use crate::transport::{SESSION_ID_HEADER, serve_listener};
use crate::{HttpTransport, SocketTransport, SseTransport, StdioTransport};

const KEY: &str = "parity-key";

/// `(method, params)` pairs in MCP form. Ids are their 1-based positions.
fn calls() -> Vec<(&'static str, Value)> {
    vec![
        ("tools/list", json!({})),
        (
            "tools/call",
            json!({"name": "echo", "arguments": {"text": "same everywhere"}}),
        ),
        ("tools/call", json!({"name": "echo", "arguments": {}})),
    ]
}

fn mcp_requests() -> Vec<Value> {
    calls()
        .into_iter()
        .enumerate()
        .map(|(i, (method, params))| {
            json!({"jsonrpc": "2.0", "id": i + 1, "method": method, "params": params})
        })
        .collect()
}

/// The `result` or `error` member of a reply, after checking its id.
fn outcome(reply: &Value, id: usize) -> Value {
    assert_eq!(reply["id"], id, "{reply}");
    reply
        .get("result")
        .or_else(|| reply.get("error"))
        .cloned()
        .unwrap_or_else(|| panic!("reply has neither result nor error: {reply}"))
}

async fn over_stdio() -> Vec<Value> {
    let input = mcp_requests()
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    let mut output = Vec::new();
    StdioTransport::new(test_server())
        .run(input.as_bytes(), &mut output)
        .await
        .unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .enumerate()
        .map(|(i, line)| outcome(&serde_json::from_str(line).unwrap(), i + 1))
        .collect()
}

async fn body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn over_http() -> Vec<Value> {
    let app = HttpTransport::new(
        test_server(),
        Some(KEY.to_string()),
        "127.0.0.1:0".parse().unwrap(),
    )
    .router();
    let post = |body: Value, session: Option<&str>| {
        let mut builder = Request::post("/mcp")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {KEY}"));
        if let Some(id) = session {
            builder = builder.header(SESSION_ID_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    };

    let init = json!({"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2025-06-18"}});
    let resp = app.clone().oneshot(post(init, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let session = resp.headers()[SESSION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let mut outcomes = Vec::new();
    for (i, request) in mcp_requests().into_iter().enumerate() {
        let resp = app
            .clone()
            .oneshot(post(request, Some(&session)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        outcomes.push(outcome(&body_json(resp.into_body()).await, i + 1));
    }
    outcomes
}

async fn next_data(stream: &mut BodyDataStream) -> String {
    let chunk = stream.next().await.unwrap().unwrap();
    let event = String::from_utf8(chunk.to_vec()).unwrap();
    event
        .lines()
        .find_map(|l| l.strip_prefix("data: "))
        .unwrap()
        .to_string()
}

async fn over_sse() -> Vec<Value> {
    let app: Router = SseTransport::new(
        test_server(),
        SharedSecret::for_http(Some(KEY.to_string())),
        "127.0.0.1:0".parse().unwrap(),
    )
    .router();
    let bearer = format!("Bearer {KEY}");

    let resp = app
        .clone()
        .oneshot(
            Request::get("/sse")
                .header("Authorization", &bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let mut stream = resp.into_body().into_data_stream();
    let endpoint = next_data(&mut stream).await;

    let mut outcomes = Vec::new();
    for (i, request) in mcp_requests().into_iter().enumerate() {
        let resp = app
            .clone()
            .oneshot(
                Request::post(endpoint.as_str())
                    .header("Authorization", &bearer)
                    .body(Body::from(request.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let message: Value = serde_json::from_str(&next_data(&mut stream).await).unwrap();
        outcomes.push(outcome(&message, i + 1));
    }
    outcomes
}

async fn over_websocket() -> Vec<Value> {
    let transport = SocketTransport::new(
        test_server(),
        Some(KEY.to_string()),
        "127.0.0.1:0".parse().unwrap(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = transport.router();
    tokio::spawn(async move {
        serve_listener(router, listener, std::future::pending())
            .await
            .unwrap()
    });

    let (mut client, _resp) = connect_async(format!("ws://{addr}/?key={KEY}"))
        .await
        .unwrap();
    let _hello = client.next().await.unwrap().unwrap();

    let mut outcomes = Vec::new();
    for (i, (method, params)) in calls().into_iter().enumerate() {
        let id = i + 1;
        let frame = match method {
            "tools/list" => json!({"id": id, "method": "list_tools"}),
            _ => json!({
                "id": id,
                "method": "call_tool",
                "name": params["name"],
                "arguments": params["arguments"],
            }),
        };
        client
            .send(WsMessage::Text(frame.to_string().into()))
            .await
            .unwrap();
        let reply = match client.next().await.unwrap().unwrap() {
            WsMessage::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        };
        outcomes.push(outcome(&reply, id));
    }
    outcomes
}

#[tokio::test]
async fn test_transports_agree_on_payloads() {
    let stdio = over_stdio().await;
    assert_eq!(stdio.len(), 3);
    assert_eq!(stdio[0]["tools"][0]["name"], "echo");
    assert_eq!(
        stdio[1],
        json!({"content": [{"type": "text", "text": "same everywhere"}], "isError": false})
    );
    assert_eq!(stdio[2]["code"], -32602);

    assert_eq!(over_http().await, stdio, "streamable HTTP");
    assert_eq!(over_sse().await, stdio, "SSE");
    assert_eq!(over_websocket().await, stdio, "WebSocket");
}
