//! Redis implementation of the connection seam.

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::manager::CacheManager;
use crate::traits::{ConnectionProvider, DatabaseHandle, ServerHandle};
use async_trait::async_trait;
use distcache_redis::{Database, Endpoint, RedisConnectionProvider, Server};
use std::time::Duration;

#[async_trait]
impl ConnectionProvider for RedisConnectionProvider {
    type Endpoint = Endpoint;
    type Database = Database;
    type Server = Server;

    fn database(&self) -> CacheResult<Database> {
        Ok(RedisConnectionProvider::database(self))
    }

    async fn endpoints(&self) -> CacheResult<Vec<Endpoint>> {
        Ok(RedisConnectionProvider::endpoints(self).await?)
    }

    async fn server(&self, endpoint: &Endpoint) -> CacheResult<Server> {
        Ok(RedisConnectionProvider::server(self, endpoint).await?)
    }
}

#[async_trait]
impl DatabaseHandle for Database {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(Database::get(self, key).await?)
    }

    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        Ok(self.set_ex(key, &payload, ttl).await?)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(Database::exists(self, key).await?)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(Database::delete(self, key).await?)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        Ok(Database::ttl(self, key).await?)
    }
}

#[async_trait]
impl ServerHandle for Server {
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        Ok(Server::keys(self, pattern).await?)
    }
}

impl CacheManager<RedisConnectionProvider> {
    /// Create a cache manager on the process-wide Redis connection.
    ///
    /// The connection is opened by the first manager created this way and
    /// reused by every later one.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use distcache::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), CacheError> {
    ///     let cache = CacheManager::connect(CacheConfig::new("redis://localhost:6379")).await?;
    ///     cache.set("greeting", "hello", 5).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: CacheConfig) -> CacheResult<Self> {
        let redis_config = config.redis_config()?;
        let provider = RedisConnectionProvider::shared(&redis_config).await?;
        Self::new(config, provider)
    }
}
