//! Auth-specific error types.

/// Errors that can occur during authentication.
///
/// The specific variant is logged; callers only ever see a uniform
/// unauthorized response.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// No credential of an accepted kind was presented.
    #[error("missing credentials")]
    MissingCredentials,

    /// Credentials were presented but do not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The transport requires a secret that was never configured.
    #[error("shared secret not configured")]
    NotConfigured,

    /// Token format is invalid (not a valid JWT).
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// JWT signature verification failed.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token issuer doesn't match the configured issuer.
    #[error("invalid issuer")]
    InvalidIssuer,

    /// Token audience doesn't match the configured audience.
    #[error("invalid audience")]
    InvalidAudience,

    /// Failed to fetch JWKS from the identity provider.
    #[error("failed to fetch JWKS: {0}")]
    JwksFetchError(String),

    /// No key in the JWKS matches the token's kid.
    #[error("no matching key for kid '{0}'")]
    NoMatchingKey(String),
}

impl AuthError {
    /// Whether the caller is at fault (vs. a server-side problem).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::MissingCredentials
                | AuthError::InvalidCredentials
                | AuthError::InvalidFormat(_)
                | AuthError::InvalidSignature(_)
                | AuthError::Expired
                | AuthError::InvalidIssuer
                | AuthError::InvalidAudience
                | AuthError::NoMatchingKey(_)
        )
    }
}
