//! Cache configuration types.

use crate::error::{CacheError, CacheResult};

/// Default TTL, in minutes, for [`CacheManager::set_default`](crate::CacheManager::set_default).
pub const DEFAULT_TTL_MINUTES: u32 = 60;

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Backend connection string, e.g. `redis://cache:6379/1`.
    ///
    /// A bare `host:port` is accepted and treated as `redis://host:port`.
    pub connection_string: String,

    /// TTL applied by `set_default`, in minutes
    pub default_ttl_minutes: u32,
}

impl CacheConfig {
    /// Create a configuration for the given connection string.
    ///
    /// # Examples
    ///
    /// ```
    /// use distcache::CacheConfig;
    ///
    /// let config = CacheConfig::new("redis://localhost:6379");
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            default_ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `CACHE_CONNECTION_STRING`, falling back to `REDIS_URL`
    /// - `CACHE_DEFAULT_TTL_MINUTES` (default: 60)
    ///
    /// A missing connection string is not reported here; it surfaces as a
    /// configuration error when the manager is constructed.
    pub fn from_env() -> Self {
        let connection_string = std::env::var("CACHE_CONNECTION_STRING")
            .or_else(|_| std::env::var("REDIS_URL"))
            .unwrap_or_default();

        let default_ttl_minutes = std::env::var("CACHE_DEFAULT_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MINUTES);

        Self {
            connection_string,
            default_ttl_minutes,
        }
    }

    /// Set the default TTL.
    pub fn with_default_ttl_minutes(mut self, minutes: u32) -> Self {
        self.default_ttl_minutes = minutes;
        self
    }

    /// Fail fast on configuration that can never work.
    pub fn validate(&self) -> CacheResult<()> {
        if self.connection_string.trim().is_empty() {
            return Err(CacheError::Config(
                "cache connection string must not be empty".into(),
            ));
        }
        if self.default_ttl_minutes == 0 {
            return Err(CacheError::InvalidTtl(0));
        }
        Ok(())
    }

    /// Connection string in URL form.
    pub fn connection_url(&self) -> String {
        let raw = self.connection_string.trim();
        if raw.contains("://") {
            raw.to_string()
        } else {
            format!("redis://{}", raw)
        }
    }

    /// Redis settings for this cache.
    ///
    /// Everything, database index included, comes from the connection
    /// string. `REDIS_*` environment variables are not consulted; build a
    /// [`RedisConfig`](distcache_redis::RedisConfig) directly for finer
    /// control.
    #[cfg(feature = "redis")]
    pub fn redis_config(&self) -> CacheResult<distcache_redis::RedisConfig> {
        self.validate()?;
        let config = distcache_redis::RedisConfig::builder()
            .url(self.connection_url())
            .build();
        config.validate()?;
        Ok(config)
    }
}
