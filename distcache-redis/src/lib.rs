//! # distcache-redis
//!
//! The shared Redis connection behind `distcache`.
//!
//! ## Features
//!
//! - **One connection per process**: a multiplexed, auto-reconnecting
//!   connection (or an async cluster connection) that every caller clones
//!   cheaply instead of opening its own
//! - **Endpoint discovery**: the node set of a standalone server or a cluster,
//!   re-read on demand
//! - **Key scans**: per-node administrative handles that enumerate keys with
//!   cursor-based `SCAN`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use distcache_redis::{RedisConfig, RedisConnectionProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::builder()
//!         .url("redis://localhost:6379")
//!         .database(2)
//!         .build();
//!
//!     // Connected once, shared by everything in the process
//!     let provider = RedisConnectionProvider::shared(&config).await?;
//!
//!     let db = provider.database();
//!     db.set_ex("greeting", b"\"hello\"", std::time::Duration::from_secs(60)).await?;
//!
//!     for endpoint in provider.endpoints().await? {
//!         let server = provider.server(&endpoint).await?;
//!         println!("{endpoint}: {:?}", server.keys("greet*").await?);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
mod database;
mod endpoint;
mod error;
mod provider;
mod server;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use database::Database;
pub use endpoint::{DEFAULT_PORT, Endpoint};
pub use error::{RedisError, Result};
pub use provider::RedisConnectionProvider;
pub use server::Server;

// Re-export redis crate for convenience
pub use redis;

/// Prelude for common imports.
///
/// ```
/// use distcache_redis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::database::Database;
    pub use crate::endpoint::Endpoint;
    pub use crate::error::{RedisError, Result};
    pub use crate::provider::RedisConnectionProvider;
    pub use crate::server::Server;
}
