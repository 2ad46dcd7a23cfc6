//! The transport abstraction and shared HTTP serving plumbing.

use std::future::Future;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use http::HeaderName;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::session::{SessionManager, TransportKind};

/// Header carrying the streamable-HTTP session id.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

/// A wire transport feeding one tool registry.
///
/// Each implementation owns its session table and authentication scheme
/// and runs until its input ends or the process is asked to stop.
#[async_trait]
pub trait Transport: Send {
    /// Which transport this is.
    fn kind(&self) -> TransportKind;

    /// Serve until shutdown.
    async fn serve(self: Box<Self>) -> Result<()>;
}

/// CORS policy for the browser-reachable transports.
///
/// Any origin may call; `Mcp-Session-Id` is readable by scripts.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)])
}

/// Wrap a transport's routes with request tracing and CORS.
pub fn with_http_layers(router: Router) -> Router {
    router.layer(TraceLayer::new_for_http()).layer(cors_layer())
}

/// Resolve `host:port` into a socket address.
pub fn listen_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .map_err(|_| Error::Address(format!("{host}:{port}")))
}

/// Bind `addr` and serve `router` until Ctrl-C.
///
/// On shutdown every session in `sessions` is closed so that long-lived
/// streams end and the server can drain.
pub async fn serve_router(router: Router, addr: SocketAddr, sessions: SessionManager) -> Result<()> {
    let kind = sessions.kind();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    log::info!("faxgate {kind} transport listening on {addr}");

    let shutdown = async move {
        shutdown_signal().await;
        let closed = sessions.close_all();
        log::info!("Closed {closed} {kind} session(s)");
    };
    serve_listener(router, listener, shutdown).await?;
    log::info!("faxgate {kind} transport stopped");
    Ok(())
}

/// Serve `router` on an already-bound listener until `shutdown` resolves.
pub async fn serve_listener(
    router: Router,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn test_listen_addr() {
        assert_eq!(
            listen_addr("0.0.0.0", 3001).unwrap(),
            "0.0.0.0:3001".parse::<SocketAddr>().unwrap()
        );
        assert!(matches!(
            listen_addr("not a host", 1),
            Err(Error::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_cors_exposes_session_header() {
        let app = with_http_layers(Router::new().route("/", get(|| async { "ok" })));
        let resp = app
            .oneshot(
                Request::get("/")
                    .header("Origin", "https://client.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-expose-headers"],
            SESSION_ID_HEADER
        );
    }

    #[tokio::test]
    async fn test_serve_listener_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/", get(|| async { "ok" }));
        serve_listener(app, listener, async {}).await.unwrap();
    }
}
