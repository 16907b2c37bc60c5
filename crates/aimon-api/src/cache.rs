//! Read-through cache over an expiring key/value backend
//!
//! Values are stored as JSON so any backend that can hold a blob with a TTL
//! can sit behind [`CacheBackend`]. The default backend is an in-process moka
//! cache with per-entry expiry.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum CacheError {
    InvalidArgument(String),
    Backend(String),
    Codec(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidArgument(msg) => write!(f, "Invalid cache argument: {}", msg),
            CacheError::Backend(msg) => write!(f, "Cache backend error: {}", msg),
            CacheError::Codec(err) => write!(f, "Cache codec error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err)
    }
}

/// An expiring key/value store holding JSON values
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns `None` when the key is missing or expired
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value and its TTL
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Approximate number of live entries, when the backend can tell
    fn entry_count(&self) -> u64 {
        0
    }
}

#[derive(Clone)]
struct Entry {
    value: Arc<Value>,
    ttl: Duration,
}

/// Gives every entry the TTL it was written with, restarting on overwrite
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process backend built on `moka::future::Cache`
pub struct MokaBackend {
    cache: Cache<String, Entry>,
}

impl MokaBackend {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }
}

impl Default for MokaBackend {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.cache.get(key).await.map(|e| (*e.value).clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: Arc::new(value),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

/// Cache statistics reported by the health endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Typed read-through layer over a [`CacheBackend`]
///
/// `get_or_set` is not single-flight: concurrent misses on the same key each
/// run their loader and the last store wins.
pub struct ReadThroughCache {
    backend: Arc<dyn CacheBackend>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReadThroughCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.backend.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Cached value for `key`, or `None` if missing, expired, or not a `T`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let value = self.peek(key).await?;
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    /// Like [`get`](Self::get) but leaves the hit/miss counters alone
    pub async fn peek<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        validate_key(key)?;

        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_value(raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape, treating as miss");
                Ok(None)
            }
        }
    }

    /// Store `value` under `key` for `ttl_secs`, overwriting any prior value
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        validate_key(key)?;
        let ttl = ttl_from_secs(ttl_secs)?;
        let raw = serde_json::to_value(value)?;
        self.backend.set(key, raw, ttl).await
    }

    /// Return the cached value, or run `loader`, store its result and return it
    pub async fn get_or_set<T, E, F, Fut>(&self, key: &str, loader: F, ttl_secs: u64) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        ttl_from_secs(ttl_secs)?;

        if let Some(value) = self.get(key).await? {
            debug!(key, "Cache hit");
            return Ok(value);
        }

        debug!(key, "Cache miss, loading");
        let value = loader().await?;
        self.set(key, &value, ttl_secs).await?;
        Ok(value)
    }
}

fn validate_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("key must not be empty".into()));
    }
    Ok(())
}

fn ttl_from_secs(ttl_secs: u64) -> Result<Duration, CacheError> {
    if ttl_secs == 0 {
        return Err(CacheError::InvalidArgument("ttl must be positive".into()));
    }
    Ok(Duration::from_secs(ttl_secs))
}
