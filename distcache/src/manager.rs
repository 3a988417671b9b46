//! High-level cache manager with typed operations.

use crate::codec;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::pattern;
use crate::traits::{ConnectionProvider, DatabaseHandle, ServerHandle};
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Deletes in flight at once during bulk invalidation.
const DELETE_CONCURRENCY: usize = 32;

/// Typed cache over a shared backend connection.
///
/// The manager is stateless: it holds the configuration and a reference to
/// the connection provider, nothing else, so it can be cloned freely and
/// called from any number of tasks.
///
/// Absent keys are not errors. [`get`](Self::get) returns `None` and
/// [`remove`](Self::remove) succeeds whether or not the key existed.
pub struct CacheManager<P: ConnectionProvider> {
    provider: Arc<P>,
    config: CacheConfig,
}

impl<P: ConnectionProvider> CacheManager<P> {
    /// Create a cache manager on an existing connection provider.
    ///
    /// Fails with [`CacheError::Config`] when the connection string is empty.
    /// The provider is borrowed, not owned: it is expected to be shared with
    /// other managers and outlive this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use distcache::*;
    /// use std::sync::Arc;
    ///
    /// let provider = Arc::new(InMemoryProvider::new());
    /// let cache = CacheManager::new(CacheConfig::new("memory://local"), provider).unwrap();
    ///
    /// assert!(CacheManager::new(CacheConfig::new(""), Arc::new(InMemoryProvider::new())).is_err());
    /// ```
    pub fn new(config: CacheConfig, provider: Arc<P>) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the connection provider.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Get a typed value from the cache.
    ///
    /// Returns `Ok(None)` for a missing or expired key, and
    /// [`CacheError::Deserialization`] when the stored payload does not fit
    /// `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        check_key(key)?;
        let payload = self.provider.database()?.get(key).await?;
        debug!(key = %key, hit = payload.is_some(), "cache get");
        codec::deserialize(payload.as_deref())
    }

    /// Get a typed value, or `T::default()` when the key is absent.
    pub async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> CacheResult<T> {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    /// Store a typed value for `ttl_minutes` minutes from now.
    ///
    /// A value that serializes to JSON `null` (such as `None`) is not
    /// stored and leaves any existing entry untouched.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_minutes: u32,
    ) -> CacheResult<()> {
        check_key(key)?;
        let ttl = ttl_from_minutes(ttl_minutes)?;
        let payload = codec::serialize(value)?;

        if codec::is_null(&payload) {
            debug!(key = %key, "cache set skipped for null value");
            return Ok(());
        }

        self.provider.database()?.set(key, payload, ttl).await?;
        debug!(key = %key, ttl_minutes, "cache set");
        Ok(())
    }

    /// Store a typed value with the configured default TTL.
    pub async fn set_default<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        self.set(key, value, self.config.default_ttl_minutes).await
    }

    /// Get or set a value using a factory function.
    ///
    /// If the key exists, returns the cached value.
    /// If not, calls the factory function, caches the result, and returns it.
    /// Two concurrent callers may both run the factory; the later write wins.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        ttl_minutes: u32,
        factory: F,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, &value, ttl_minutes).await?;
        Ok(value)
    }

    /// Check if a key is present, without fetching its value.
    pub async fn is_set(&self, key: &str) -> CacheResult<bool> {
        check_key(key)?;
        self.provider.database()?.exists(key).await
    }

    /// Remove a key. Removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> CacheResult<()> {
        check_key(key)?;
        let removed = self.provider.database()?.delete(key).await?;
        debug!(key = %key, removed, "cache remove");
        Ok(())
    }

    /// Remaining time-to-live of a key.
    pub async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        check_key(key)?;
        self.provider.database()?.ttl(key).await
    }

    /// Remove every key containing `pattern` as a literal, case-sensitive
    /// substring, on every backend node.
    ///
    /// Best-effort and not atomic: each node's keys are scanned into a
    /// snapshot and then deleted one by one. Keys written concurrently may
    /// survive, and keys that expire between scan and delete are skipped
    /// silently. Returns the number of keys actually deleted.
    pub async fn remove_by_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let glob = pattern::contains_glob(pattern);
        let deleted = self.remove_matching(&glob).await?;
        info!(pattern = %pattern, deleted, "cache entries removed by pattern");
        Ok(deleted)
    }

    /// Remove every key in the logical database, on every backend node.
    ///
    /// Deletes keys one by one rather than issuing `FLUSHDB`, so it works
    /// without administrative privileges. Same consistency caveats as
    /// [`remove_by_pattern`](Self::remove_by_pattern).
    pub async fn clear(&self) -> CacheResult<usize> {
        let deleted = self.remove_matching(pattern::MATCH_ALL).await?;
        info!(deleted, "cache cleared");
        Ok(deleted)
    }

    /// Release this manager.
    ///
    /// Deliberately leaves the shared connection open: it belongs to
    /// whoever created the provider and may still be in use elsewhere.
    pub fn dispose(self) {
        debug!("cache manager disposed; shared connection left open");
    }

    async fn remove_matching(&self, glob: &str) -> CacheResult<usize> {
        let database = self.provider.database()?;
        let mut deleted = 0;

        // Every node must be visited: a cluster partitions the keyspace.
        for endpoint in self.provider.endpoints().await? {
            let server = self.provider.server(&endpoint).await?;
            let keys = server.keys(glob).await?;
            debug!(endpoint = %endpoint, matched = keys.len(), "keys scanned");

            deleted += stream::iter(keys.iter())
                .map(|key| database.delete(key))
                .buffer_unordered(DELETE_CONCURRENCY)
                .try_fold(0usize, |count, removed| async move {
                    Ok::<_, CacheError>(count + usize::from(removed))
                })
                .await?;
        }

        Ok(deleted)
    }
}

impl<P: ConnectionProvider> Clone for CacheManager<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

fn check_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn ttl_from_minutes(minutes: u32) -> CacheResult<Duration> {
    if minutes == 0 {
        return Err(CacheError::InvalidTtl(minutes));
    }
    Ok(Duration::from_secs(u64::from(minutes) * 60))
}
