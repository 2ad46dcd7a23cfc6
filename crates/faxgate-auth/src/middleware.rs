//! Generic Tower authentication middleware.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with credential
//! checks. Generic over `Authenticator`, so the same layer guards the
//! shared-secret HTTP transport and the JWT-protected SSE transport.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, Authenticator, Credentials, Principal};

/// Tower `Layer` that wraps services with authentication.
pub struct AuthLayer<A: Authenticator> {
    authenticator: Arc<A>,
    config: AuthConfig,
}

impl<A: Authenticator> AuthLayer<A> {
    /// Create a new auth layer with the given authenticator and config.
    pub fn new(authenticator: Arc<A>, config: AuthConfig) -> Self {
        Self {
            authenticator,
            config,
        }
    }
}

impl<A: Authenticator> Clone for AuthLayer<A> {
    fn clone(&self) -> Self {
        Self {
            authenticator: self.authenticator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A: Authenticator, S> Layer<S> for AuthLayer<A> {
    type Service = AuthService<A, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            authenticator: self.authenticator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that authenticates requests before forwarding them.
///
/// On success, inserts the [`Principal`] into request extensions where it's
/// available to downstream handlers.
pub struct AuthService<A: Authenticator, S> {
    inner: S,
    authenticator: Arc<A>,
    config: AuthConfig,
}

impl<A: Authenticator, S: Clone> Clone for AuthService<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            authenticator: self.authenticator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A, S> Service<Request<Body>> for AuthService<A, S>
where
    A: Authenticator,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let authenticator = self.authenticator.clone();
        let config = self.config.clone();

        Box::pin(async move {
            if config.enabled {
                let credentials = Credentials::from_request(&req);
                match authenticator.authenticate(&credentials).await {
                    Ok(principal) => {
                        req.extensions_mut().insert(principal);
                    }
                    Err(auth_err) if auth_err.is_client_error() => {
                        log::warn!(
                            "Authentication failed for {} {}: {auth_err}",
                            req.method(),
                            req.uri().path()
                        );
                        return Ok(unauthorized_response(&auth_err, &config));
                    }
                    Err(auth_err) => {
                        log::error!(
                            "Cannot authenticate {} {}: {auth_err}",
                            req.method(),
                            req.uri().path()
                        );
                        return Ok(unauthorized_response(&auth_err, &config));
                    }
                }
            } else {
                req.extensions_mut().insert(Principal::anonymous());
            }

            let resp = inner
                .call(req)
                .await
                .unwrap_or_else(|infallible| match infallible {});
            Ok(resp.into_response())
        })
    }
}

/// Build the 401 response for a failed authentication.
///
/// The body never says why a credential was rejected. The one exception is a
/// transport whose secret was never configured, which is an operator problem
/// and says so.
pub fn unauthorized_response(err: &AuthError, config: &AuthConfig) -> axum::response::Response {
    let message = match err {
        AuthError::NotConfigured => "Unauthorized: shared secret not configured",
        _ => "Unauthorized",
    };
    let body = serde_json::json!({ "error": message });

    let mut response = (
        StatusCode::UNAUTHORIZED,
        [(http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response();

    let www_auth = match config.resource_url.as_deref() {
        Some(url) => format!(
            r#"Bearer resource_metadata="{}/.well-known/oauth-protected-resource""#,
            url.trim_end_matches('/')
        ),
        None => "Bearer".to_string(),
    };
    if let Ok(value) = http::HeaderValue::from_str(&www_auth) {
        response
            .headers_mut()
            .insert(http::header::WWW_AUTHENTICATE, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthFuture, AuthMethod, SharedSecret};
    use std::sync::Mutex;
    use tower::ServiceExt;

    // Accepts bearer "valid-token" and rejects everything else.
    struct TestAuthenticator;

    impl Authenticator for TestAuthenticator {
        fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
            Box::pin(async move {
                match credentials.bearer.as_deref() {
                    Some("valid-token") => Ok(Principal::new("sub_123", AuthMethod::Bearer)),
                    Some(_) => Err(AuthError::InvalidSignature("bad token".to_string())),
                    None => Err(AuthError::MissingToken),
                }
            })
        }
    }

    fn config_enabled() -> AuthConfig {
        AuthConfig {
            enabled: true,
            resource_url: Some("https://fax.example.com/".to_string()),
        }
    }

    /// Mock inner service that captures the Principal.
    #[derive(Clone)]
    struct MockService {
        captured: Arc<Mutex<Option<Principal>>>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                captured: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl Service<Request<Body>> for MockService {
        type Response = axum::response::Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let captured = self.captured.clone();
            Box::pin(async move {
                let principal = req.extensions().get::<Principal>().cloned();
                *captured.lock().unwrap() = principal;
                Ok((StatusCode::OK, "ok").into_response())
            })
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_unauthorized_response_headers() {
        let resp = unauthorized_response(&AuthError::Expired, &config_enabled());
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers()[http::header::WWW_AUTHENTICATE],
            r#"Bearer resource_metadata="https://fax.example.com/.well-known/oauth-protected-resource""#
        );
    }

    #[test]
    fn test_unauthorized_response_without_resource_url() {
        let resp = unauthorized_response(&AuthError::MissingToken, &AuthConfig::default());
        assert_eq!(resp.headers()[http::header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_middleware_disabled_passes_through() {
        let mock = MockService::new();
        let captured = mock.captured.clone();
        let service = AuthLayer::new(Arc::new(TestAuthenticator), AuthConfig::default()).layer(mock);

        let req = Request::builder().body(Body::empty()).unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            captured.lock().unwrap().as_ref().unwrap().method,
            AuthMethod::Anonymous
        );
    }

    #[tokio::test]
    async fn test_failures_share_one_shape() {
        let mut bodies = Vec::new();
        for header in [None, Some("Basic abc"), Some("Bearer bad-token")] {
            let service =
                AuthLayer::new(Arc::new(TestAuthenticator), config_enabled()).layer(MockService::new());
            let mut builder = Request::builder();
            if let Some(value) = header {
                builder = builder.header("Authorization", value);
            }
            let resp = service.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            bodies.push(body_json(resp).await);
        }
        assert!(bodies.iter().all(|b| b == &serde_json::json!({"error": "Unauthorized"})));
    }

    #[tokio::test]
    async fn test_middleware_valid_token_injects_principal() {
        let mock = MockService::new();
        let captured = mock.captured.clone();
        let service = AuthLayer::new(Arc::new(TestAuthenticator), config_enabled()).layer(mock);

        let req = Request::builder()
            .header("Authorization", "Bearer valid-token")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let principal = captured.lock().unwrap();
        let principal = principal.as_ref().expect("Principal should be present");
        assert_eq!(principal.subject, "sub_123");
        assert_eq!(principal.method, AuthMethod::Bearer);
    }

    #[tokio::test]
    async fn test_unconfigured_secret_fails_closed() {
        let config = AuthConfig {
            enabled: true,
            resource_url: None,
        };
        let service =
            AuthLayer::new(Arc::new(SharedSecret::for_http(None)), config).layer(MockService::new());
        let req = Request::builder()
            .header("X-API-Key", "whatever")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(resp).await["error"],
            "Unauthorized: shared secret not configured"
        );
    }
}
