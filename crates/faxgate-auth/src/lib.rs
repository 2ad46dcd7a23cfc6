//! Authentication primitives for faxgate transports.
//!
//! Provides:
//! - [`Credentials`]: Bearer token, `X-API-Key` header and `key` query parameter of a request
//! - [`Authenticator`]: Trait deciding whether credentials identify a [`Principal`]
//! - [`SharedSecret`]: Shared-secret authenticator (fail-closed or fail-open when unset)
//! - [`TokenValidator`] / [`BearerAuthenticator`]: Bearer-token validation (e.g. JWT)
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `Authenticator`
//! - [`AuthError`]: Auth-specific error types

mod credentials;
mod error;
mod middleware;
mod principal;
mod secret;

pub use credentials::{API_KEY_HEADER, Credentials, KEY_QUERY_PARAM};
pub use error::AuthError;
pub use middleware::{AuthLayer, AuthService, unauthorized_response};
pub use principal::{AuthMethod, Principal, principal_from_parts};
pub use secret::{CredentialSource, SharedSecret};

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by authenticators and validators.
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<Principal, AuthError>> + Send + 'a>>;

/// Configuration for the auth middleware.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    pub enabled: bool,
    /// Public URL of the protected resource. When set, 401 responses point
    /// clients at its OAuth protected-resource metadata.
    pub resource_url: Option<String>,
}

/// Decides whether a request's credentials are acceptable.
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticate the credentials and return who they belong to.
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a>;
}

/// Trait for validating bearer tokens.
///
/// Implement this for each token issuer (JWKS-backed JWT, static tokens, ...).
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the principal it identifies.
    fn validate<'a>(&'a self, token: &'a str) -> AuthFuture<'a>;
}

/// [`Authenticator`] accepting requests whose bearer token passes a
/// [`TokenValidator`].
pub struct BearerAuthenticator<V: TokenValidator> {
    validator: V,
}

impl<V: TokenValidator> BearerAuthenticator<V> {
    /// Wrap a validator.
    pub fn new(validator: V) -> Self {
        Self { validator }
    }
}

impl<V: TokenValidator> Authenticator for BearerAuthenticator<V> {
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        let Some(token) = credentials.bearer.as_deref() else {
            return Box::pin(async { Err::<Principal, _>(AuthError::MissingToken) });
        };
        self.validator.validate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedValidator;

    impl TokenValidator for FixedValidator {
        fn validate<'a>(&'a self, token: &'a str) -> AuthFuture<'a> {
            Box::pin(async move {
                if token == "good" {
                    Ok(Principal::new("client-1", AuthMethod::Bearer))
                } else {
                    Err(AuthError::InvalidSignature("bad token".into()))
                }
            })
        }
    }

    fn bearer(token: Option<&str>) -> Credentials {
        Credentials {
            bearer: token.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bearer_authenticator_accepts_valid_token() {
        let auth = BearerAuthenticator::new(FixedValidator);
        let principal = auth.authenticate(&bearer(Some("good"))).await.unwrap();
        assert_eq!(principal.subject, "client-1");
        assert_eq!(principal.method, AuthMethod::Bearer);
    }

    #[tokio::test]
    async fn test_bearer_authenticator_rejects() {
        let auth = BearerAuthenticator::new(FixedValidator);
        assert!(matches!(
            auth.authenticate(&bearer(None)).await,
            Err(AuthError::MissingToken)
        ));
        assert!(auth.authenticate(&bearer(Some("bad"))).await.is_err());
    }

    #[tokio::test]
    async fn test_api_key_is_not_a_bearer_token() {
        let auth = BearerAuthenticator::new(FixedValidator);
        let creds = Credentials {
            api_key: Some("good".into()),
            ..Default::default()
        };
        assert!(auth.authenticate(&creds).await.is_err());
    }
}
