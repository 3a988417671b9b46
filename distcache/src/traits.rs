//! Backend connection seam.
//!
//! The cache manager talks to its backend only through these traits. The
//! Redis implementation lives in [`redis_backend`](crate::redis_backend); an
//! in-process one in [`memory`](crate::memory).

use crate::error::CacheResult;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Source of the shared backend connection.
///
/// Implementations must be safe for unlimited concurrent use without
/// external locking; the cache manager adds none.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Address of one backend node.
    type Endpoint: Clone + fmt::Display + Send + Sync;

    /// Handle for key-level commands on the logical database.
    type Database: DatabaseHandle;

    /// Handle for administrative key scans on one node.
    type Server: ServerHandle;

    /// The shared handle bound to the configured logical database.
    fn database(&self) -> CacheResult<Self::Database>;

    /// Every backend node currently known, recomputed on each call.
    async fn endpoints(&self) -> CacheResult<Vec<Self::Endpoint>>;

    /// Administrative handle for `endpoint`.
    async fn server(&self, endpoint: &Self::Endpoint) -> CacheResult<Self::Server>;
}

/// Key-level commands against one logical database.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Raw payload stored under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `payload` under `key`, expiring `ttl` from now.
    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Delete a key. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Remaining time-to-live, `None` if the key is absent or never expires.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;
}

/// Key enumeration on a single node.
#[async_trait]
pub trait ServerHandle: Send + Sync {
    /// Snapshot of the keys on this node matching the glob `pattern`
    /// (`*`, `?`, `[...]`, backslash escapes).
    ///
    /// The snapshot may already be stale when it is returned.
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;
}
