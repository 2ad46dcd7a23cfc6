//! JWKS-backed JWT validation for faxgate.
//!
//! Implements [`faxgate_auth::TokenValidator`] for any OAuth2 issuer that
//! publishes its signing keys as a JSON Web Key Set:
//! - RS256/RS384/RS512 signature verification against the issuer's keys
//! - `iss` and `aud` claim checks
//! - JWKS key caching with TTL-based refresh
//! - at most one refetch per cooldown window for unknown `kid`s

use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use faxgate_auth::{AuthError, AuthFuture, AuthMethod, Principal, TokenValidator};

/// TTL for cached JWKS keys (1 hour).
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Minimum gap between refetches triggered by an unknown `kid`.
const JWKS_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// Timeout for a JWKS fetch.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A single JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key ID, matched against the JWT header's `kid`.
    #[serde(default)]
    pub kid: Option<String>,
    /// Key type; only `RSA` keys are usable.
    #[serde(default)]
    pub kty: Option<String>,
    /// RSA modulus (base64url-encoded).
    #[serde(default)]
    pub n: String,
    /// RSA exponent (base64url-encoded).
    #[serde(default)]
    pub e: String,
}

impl Jwk {
    fn is_rsa(&self) -> bool {
        self.kty.as_deref().is_none_or(|kty| kty == "RSA") && !self.n.is_empty() && !self.e.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Cached JWKS keys with fetch timestamp.
struct CachedKeys {
    keys: Vec<Jwk>,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
}

/// JWT validator backed by a remote JWKS, with key caching.
pub struct JwksTokenValidator {
    cached: RwLock<Option<CachedKeys>>,
    last_refresh: Mutex<Option<Instant>>,
    refresh_cooldown: Duration,
    jwks_url: String,
    issuer: String,
    audience: String,
    http_client: Option<reqwest::Client>,
}

impl JwksTokenValidator {
    /// Create a validator that fetches keys from `jwks_url` and accepts
    /// tokens issued by `issuer` for `audience`.
    pub fn new(
        jwks_url: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .ok();
        Self {
            cached: RwLock::new(None),
            last_refresh: Mutex::new(None),
            refresh_cooldown: JWKS_REFRESH_COOLDOWN,
            jwks_url: jwks_url.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            http_client,
        }
    }

    /// Create a validator with pre-loaded keys (for testing).
    #[cfg(test)]
    pub fn with_static_keys(keys: Vec<Jwk>, issuer: &str, audience: &str) -> Self {
        Self {
            cached: RwLock::new(Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            })),
            last_refresh: Mutex::new(None),
            refresh_cooldown: JWKS_REFRESH_COOLDOWN,
            jwks_url: String::new(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            http_client: None,
        }
    }

    /// Override the minimum gap between refetches for unknown `kid`s.
    #[cfg(test)]
    fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// The JWKS endpoint keys are fetched from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Validate a bearer JWT.
    async fn validate_token(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidFormat(e.to_string()))?;
        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            return Err(AuthError::InvalidFormat(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let key = self.find_key(header.kid.as_deref()).await?;
        let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    AuthError::InvalidFormat(e.to_string())
                }
                _ => AuthError::InvalidSignature(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        let subject = claims
            .sub
            .or(claims.client_id)
            .unwrap_or_else(|| "unknown".to_string());
        log::debug!("Bearer token validated for {subject}");
        Ok(Principal::new(subject, AuthMethod::Bearer))
    }

    /// Find a key by `kid`, fetching/refreshing the cache as needed.
    ///
    /// A token without `kid` is accepted only when the set holds exactly one
    /// RSA key. While the cached set is still fresh, a miss refetches at most
    /// once per cooldown window.
    async fn find_key(&self, kid: Option<&str>) -> Result<Jwk, AuthError> {
        if let Some(key) = self.lookup_cached(kid) {
            return Ok(key);
        }

        if self.http_client.is_some() && self.claim_refresh() {
            self.refresh_keys().await?;
            if let Some(key) = self.lookup_cached(kid) {
                return Ok(key);
            }
        }

        Err(AuthError::NoMatchingKey(kid.unwrap_or("<none>").to_string()))
    }

    /// Record a refetch attempt, or refuse one inside the cooldown window.
    fn claim_refresh(&self) -> bool {
        let Ok(mut last) = self.last_refresh.lock() else {
            return false;
        };
        let cooling = last.is_some_and(|at| at.elapsed() < self.refresh_cooldown);
        if cooling && self.has_fresh_keys() {
            log::debug!("JWKS refetch skipped: last attempt inside cooldown");
            return false;
        }
        *last = Some(Instant::now());
        true
    }

    fn has_fresh_keys(&self) -> bool {
        self.cached.read().is_ok_and(|cache| {
            cache
                .as_ref()
                .is_some_and(|c| c.fetched_at.elapsed() <= JWKS_CACHE_TTL)
        })
    }

    fn lookup_cached(&self, kid: Option<&str>) -> Option<Jwk> {
        let cache = self.cached.read().ok()?;
        let cached = cache.as_ref()?;

        if self.http_client.is_some() && cached.fetched_at.elapsed() > JWKS_CACHE_TTL {
            return None;
        }

        let mut usable = cached.keys.iter().filter(|k| k.is_rsa());
        match kid {
            Some(kid) => usable.find(|k| k.kid.as_deref() == Some(kid)).cloned(),
            None => {
                let first = usable.next()?;
                usable.next().is_none().then(|| first.clone())
            }
        }
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        let client = self.http_client.as_ref().ok_or_else(|| {
            AuthError::JwksFetchError("no HTTP client (static keys mode)".to_string())
        })?;

        log::debug!("Fetching JWKS from {}", self.jwks_url);
        let response: JwksResponse = client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let mut cache = self
            .cached
            .write()
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        *cache = Some(CachedKeys {
            keys: response.keys,
            fetched_at: Instant::now(),
        });

        Ok(())
    }
}

impl TokenValidator for JwksTokenValidator {
    fn validate<'a>(&'a self, token: &'a str) -> AuthFuture<'a> {
        Box::pin(self.validate_token(token))
    }
}
