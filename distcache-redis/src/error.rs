//! Redis error types.

use thiserror::Error;

/// Result type for Redis operations.
pub type Result<T> = std::result::Result<T, RedisError>;

/// Redis errors.
#[derive(Debug, Error)]
pub enum RedisError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error.
    #[error("Operation timed out")]
    Timeout,

    /// Cluster error.
    #[error("Cluster error: {0}")]
    Cluster(String),

    /// Underlying Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RedisError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Redis(err) => {
                err.is_timeout() || err.is_connection_dropped() || err.is_io_error()
            }
            _ => false,
        }
    }

    /// Check if this error indicates the backend is unreachable or the
    /// connection was lost.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Redis(err) => {
                err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error()
            }
            _ => false,
        }
    }
}

impl From<url::ParseError> for RedisError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid connection url: {}", err))
    }
}
