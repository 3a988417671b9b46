//! Shared connection and the logical-database handle built on it.

use redis::aio::ConnectionManager;
use redis::cluster_async::ClusterConnection;
use redis::{Cmd, FromRedisValue, RedisResult};
use std::time::Duration;
use tracing::debug;

use crate::Result;

/// The one multiplexed link to the backend.
///
/// Both variants are cheap to clone: clones share the underlying socket and
/// pipeline requests over it, so the connection can be used from any number
/// of tasks without external locking.
#[derive(Clone)]
pub(crate) enum SharedConnection {
    /// Single server (or a proxy in front of one).
    Standalone(ConnectionManager),
    /// Redis Cluster; commands are routed by key slot.
    Cluster(ClusterConnection),
}

impl SharedConnection {
    /// Run a single command over the shared link.
    pub(crate) async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> RedisResult<T> {
        match self {
            Self::Standalone(conn) => {
                let mut conn = conn.clone();
                cmd.query_async(&mut conn).await
            }
            Self::Cluster(conn) => {
                let mut conn = conn.clone();
                cmd.query_async(&mut conn).await
            }
        }
    }

    pub(crate) fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster(_))
    }
}

/// Handle to the configured logical database.
///
/// Obtained from [`RedisConnectionProvider::database`](crate::RedisConnectionProvider::database);
/// cloning it never opens a new connection.
#[derive(Clone)]
pub struct Database {
    conn: SharedConnection,
    index: i64,
}

impl Database {
    pub(crate) fn new(conn: SharedConnection, index: i64) -> Self {
        Self { conn, index }
    }

    /// Logical database index this handle is bound to.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Fetch the raw payload stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self.conn.query(redis::cmd("GET").arg(key)).await?;
        Ok(value)
    }

    /// Store `payload` under `key`, expiring after `ttl`.
    ///
    /// Sub-second TTLs are rounded up to one second, the smallest `EX` unit.
    pub async fn set_ex(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()> {
        let seconds = ttl.as_secs().max(1);
        let _: () = self
            .conn
            .query(redis::cmd("SET").arg(key).arg(payload).arg("EX").arg(seconds))
            .await?;
        debug!(key = %key, ttl_secs = seconds, "SET EX");
        Ok(())
    }

    /// Check if a key exists.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let exists: bool = self.conn.query(redis::cmd("EXISTS").arg(key)).await?;
        Ok(exists)
    }

    /// Delete a key. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let deleted: u64 = self.conn.query(redis::cmd("DEL").arg(key)).await?;
        Ok(deleted > 0)
    }

    /// Remaining time-to-live of a key.
    ///
    /// `None` when the key is absent or has no expiration.
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let millis: i64 = self.conn.query(redis::cmd("PTTL").arg(key)).await?;
        if millis < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(millis as u64)))
        }
    }

    /// Round-trip a `PING`.
    pub async fn ping(&self) -> Result<()> {
        let _: String = self.conn.query(&redis::cmd("PING")).await?;
        Ok(())
    }
}
