//! Shared-secret authentication.

use subtle::ConstantTimeEq;

use crate::{AuthError, AuthFuture, Authenticator, AuthMethod, Credentials, Principal};

/// Where a shared secret may be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// `Authorization: Bearer <secret>`.
    Bearer,
    /// `X-API-Key: <secret>`.
    ApiKeyHeader,
    /// `?key=<secret>`.
    QueryKey,
}

impl CredentialSource {
    fn pick(self, credentials: &Credentials) -> Option<&str> {
        match self {
            CredentialSource::Bearer => credentials.bearer.as_deref(),
            CredentialSource::ApiKeyHeader => credentials.api_key.as_deref(),
            CredentialSource::QueryKey => credentials.query_key.as_deref(),
        }
    }
}

/// Authenticates callers against one configured secret.
///
/// HTTP compares only the first source (in the configured order) that
/// carries a value; sockets accept a match from any source. When no secret
/// is configured the authenticator either rejects everything or admits
/// everyone, depending on how it was built.
#[derive(Clone)]
pub struct SharedSecret {
    secret: Option<String>,
    required: bool,
    match_any: bool,
    sources: Vec<CredentialSource>,
}

impl SharedSecret {
    /// Secret presented as a bearer token or `X-API-Key`; every request is
    /// rejected while no secret is configured.
    pub fn for_http(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            required: true,
            match_any: false,
            sources: vec![CredentialSource::Bearer, CredentialSource::ApiKeyHeader],
        }
    }

    /// Secret presented as `?key=` or `X-API-Key`; connections are admitted
    /// unauthenticated while no secret is configured.
    pub fn for_socket(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            required: false,
            match_any: true,
            sources: vec![CredentialSource::QueryKey, CredentialSource::ApiKeyHeader],
        }
    }

    /// Whether a secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Check credentials synchronously.
    pub fn check(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let Some(secret) = self.secret.as_deref() else {
            return if self.required {
                Err(AuthError::NotConfigured)
            } else {
                Ok(Principal::anonymous())
            };
        };

        let mut presented = self
            .sources
            .iter()
            .filter_map(|source| source.pick(credentials))
            .peekable();
        if presented.peek().is_none() {
            return Err(AuthError::MissingCredentials);
        }

        let matched = if self.match_any {
            presented.any(|value| secrets_match(value, secret))
        } else {
            presented
                .next()
                .is_some_and(|value| secrets_match(value, secret))
        };

        if matched {
            Ok(Principal::new("shared-secret", AuthMethod::SharedSecret))
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("configured", &self.is_configured())
            .field("required", &self.required)
            .field("match_any", &self.match_any)
            .field("sources", &self.sources)
            .finish()
    }
}

impl Authenticator for SharedSecret {
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        let result = self.check(credentials);
        Box::pin(async move { result })
    }
}

/// Slices of different lengths never match.
fn secrets_match(presented: &str, secret: &str) -> bool {
    presented.as_bytes().ct_eq(secret.as_bytes()).into()
}
