//! Authenticated principal and extraction helpers.

/// How a principal proved its identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication was required.
    Anonymous,
    /// A configured shared secret.
    SharedSecret,
    /// A validated bearer token.
    Bearer,
}

/// An authenticated caller.
///
/// Stored in HTTP request extensions by the auth middleware.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Token subject, or a fixed label for shared-secret callers.
    pub subject: String,
    /// How the caller authenticated.
    pub method: AuthMethod,
}

impl Principal {
    /// Create a principal.
    pub fn new(subject: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            subject: subject.into(),
            method,
        }
    }

    /// The unauthenticated caller of an open transport.
    pub fn anonymous() -> Self {
        Self::new("anonymous", AuthMethod::Anonymous)
    }
}

/// Extract the `Principal` from HTTP request `Parts`, if present.
pub fn principal_from_parts(parts: &http::request::Parts) -> Option<&Principal> {
    parts.extensions.get::<Principal>()
}
