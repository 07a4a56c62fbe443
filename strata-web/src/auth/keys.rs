//! Signing-key retrieval and caching
//!
//! Token signatures are verified against keys published by the identity
//! provider. Keys are fetched on demand and cached until the expiry the
//! provider advertises; the cache is an injectable component shared across
//! concurrent authentication attempts, with a single in-flight fetch under
//! concurrent misses.

use super::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// One RSA verification key, as published in the provider's JWK set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
    /// RSA modulus, base64url
    pub n: String,
    /// RSA exponent, base64url
    pub e: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Fetches the current key set plus the instant it expires.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch(&self) -> Result<(Vec<Jwk>, DateTime<Utc>), AuthError>;
}

/// Key fetcher against the identity provider's JWKS endpoint.
///
/// The expiry comes from the response's `Expires` header when present,
/// otherwise `fallback_ttl` from now.
pub struct HttpKeyFetcher {
    client: reqwest::Client,
    url: String,
    fallback_ttl: Duration,
}

impl HttpKeyFetcher {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            fallback_ttl: Duration::minutes(10),
        }
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self) -> Result<(Vec<Jwk>, DateTime<Utc>), AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeyRetrieval(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::KeyRetrieval(e.to_string()))?;

        let expires = response
            .headers()
            .get("expires")
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or_else(|| Utc::now() + self.fallback_ttl);

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyRetrieval(e.to_string()))?;

        info!(count = jwks.keys.len(), %expires, "Fetched signing keys");
        Ok((jwks.keys, expires))
    }
}

/// TTL-aware concurrent cache of signing keys, keyed by expiry timestamp.
pub struct SigningKeyCache {
    fetcher: Arc<dyn KeyFetcher>,
    entries: RwLock<BTreeMap<DateTime<Utc>, Vec<Jwk>>>,
    /// Serializes upstream fetches so concurrent misses trigger one request.
    fetch_lock: Mutex<()>,
}

impl SigningKeyCache {
    pub fn new(fetcher: Arc<dyn KeyFetcher>) -> Self {
        Self {
            fetcher,
            entries: RwLock::new(BTreeMap::new()),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Return the freshest unexpired key set, fetching from the provider on
    /// a miss. Expired entries are evicted on every call.
    pub async fn get_or_fetch(&self, now: DateTime<Utc>) -> Result<Vec<Jwk>, AuthError> {
        {
            let mut entries = self.entries.write().await;
            let expired: Vec<DateTime<Utc>> =
                entries.range(..=now).map(|(expiry, _)| *expiry).collect();
            for expiry in expired {
                debug!(%expiry, "Evicting expired signing keys");
                entries.remove(&expiry);
            }

            if let Some((_, keys)) = entries.iter().next_back() {
                return Ok(keys.clone());
            }
        }

        let _guard = self.fetch_lock.lock().await;

        // Another authentication attempt may have filled the cache while we
        // waited for the lock.
        {
            let entries = self.entries.read().await;
            if let Some((expiry, keys)) = entries.iter().next_back() {
                if *expiry > now {
                    return Ok(keys.clone());
                }
            }
        }

        let (keys, expires) = self.fetcher.fetch().await?;
        if expires <= now {
            warn!(%expires, "Provider returned already-expired keys; serving uncached");
            return Ok(keys);
        }

        let mut entries = self.entries.write().await;
        entries.insert(expires, keys.clone());
        Ok(keys)
    }

    /// Number of live cache entries, for diagnostics.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
