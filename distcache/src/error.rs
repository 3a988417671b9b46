//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
///
/// A missing key is never an error: reads report it as `None`, removals
/// succeed silently.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Error from the shared Redis connection, passed through unchanged
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] distcache_redis::RedisError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Connection error from a non-Redis provider
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty or otherwise unusable key
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// TTL outside the accepted range
    #[error("Invalid TTL: {0} minutes (must be at least 1)")]
    InvalidTtl(u32),

    /// Key pattern that cannot be matched
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

impl CacheError {
    /// Whether the backend was unreachable or the connection dropped.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            #[cfg(feature = "redis")]
            Self::Redis(err) => err.is_connection_error(),
            _ => false,
        }
    }
}
