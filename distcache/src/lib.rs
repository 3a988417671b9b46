//! Typed caching over a shared key-value backend.
//!
//! A single "get-or-compute" cache layer that behaves the same on one server
//! and across many application instances sharing one Redis deployment.
//!
//! # Features
//!
//! - `redis` - Redis backend through `distcache-redis` (enabled by default)
//! - **JSON payloads** - values are stored as UTF-8 JSON with a TTL in minutes
//! - **Pattern invalidation** - remove every key containing a substring, on
//!   every node of a cluster
//! - **In-memory backend** - same contract without a server, for tests and
//!   single-process deployments
//!
//! # Examples
//!
//! ## Redis Cache
//!
//! ```no_run
//! use distcache::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Profile {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CacheError> {
//!     let cache = CacheManager::connect(CacheConfig::from_env()).await?;
//!
//!     let profile = cache
//!         .get_or_set("user:1:profile", 30, || async {
//!             Ok(Profile { name: "Alice".into() })
//!         })
//!         .await?;
//!
//!     // Drop everything cached for user 1
//!     cache.remove_by_pattern("user:1").await?;
//!     # let _ = profile;
//!     Ok(())
//! }
//! ```
//!
//! ## Sharing one connection
//!
//! ```no_run
//! use distcache::*;
//! use distcache_redis::{RedisConfig, RedisConnectionProvider};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), CacheError> {
//! let provider = Arc::new(RedisConnectionProvider::connect(RedisConfig::from_env().build()).await?);
//!
//! let sessions = CacheManager::new(CacheConfig::new("redis://localhost:6379"), provider.clone())?;
//! let pages = CacheManager::new(CacheConfig::new("redis://localhost:6379"), provider)?;
//! # let _ = (sessions, pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## In-memory Cache
//!
//! ```
//! use distcache::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), CacheError> {
//! let cache = CacheManager::new(CacheConfig::new("memory://"), Arc::new(InMemoryProvider::new()))?;
//!
//! cache.set("answer", &42, 5).await?;
//! assert_eq!(cache.get::<u32>("answer").await?, Some(42));
//! assert_eq!(cache.get_or_default::<u32>("missing").await?, 0);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod pattern;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_backend;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use manager::CacheManager;
pub use memory::{InMemoryProvider, MemoryNode};
pub use traits::{ConnectionProvider, DatabaseHandle, ServerHandle};

#[cfg(feature = "redis")]
pub use distcache_redis;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::CacheConfig;
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::manager::CacheManager;
    pub use crate::memory::InMemoryProvider;
    pub use crate::traits::{ConnectionProvider, DatabaseHandle, ServerHandle};

    #[cfg(feature = "redis")]
    pub use distcache_redis::{RedisConfig, RedisConnectionProvider};
}
