//! Process-wide connection provider.

use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::cluster::ClusterClient;
use redis::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::database::SharedConnection;
use crate::{Database, Endpoint, RedisConfig, RedisError, Result, Server};

static SHARED: OnceCell<Arc<RedisConnectionProvider>> = OnceCell::const_new();

/// Owner of the single long-lived backend connection.
///
/// Create it once at startup, either with [`connect`](Self::connect) and pass
/// the `Arc` around, or through the lazily-initialized process-wide
/// [`shared`](Self::shared) instance. Every handle it gives out borrows the
/// same multiplexed connection; none of them open sockets of their own,
/// except the per-node admin connections used for key scans in cluster mode,
/// which are opened once per node and reused.
///
/// Dropping the last `Arc` closes the connection. Holders that did not
/// create the provider must not try to close it.
pub struct RedisConnectionProvider {
    config: RedisConfig,
    connection: SharedConnection,
    primary: Option<Endpoint>,
    nodes: Mutex<HashMap<Endpoint, ConnectionManager>>,
}

impl RedisConnectionProvider {
    /// Open the connection described by `config`.
    ///
    /// Fails with [`RedisError::Timeout`] when the backend does not answer
    /// within `connection_timeout`, and with [`RedisError::Connection`] or
    /// [`RedisError::Cluster`] when it refuses.
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        config.validate()?;

        let connection = timeout(config.connection_timeout, Self::open(&config))
            .await
            .map_err(|_| RedisError::Timeout)??;

        let primary = Endpoint::from_url(&config.url).ok();

        info!(
            endpoint = %primary.as_ref().map(ToString::to_string).unwrap_or_default(),
            cluster = config.cluster,
            database = config.database_index(),
            "Redis connection established"
        );

        Ok(Self {
            config,
            connection,
            primary,
            nodes: Mutex::new(HashMap::new()),
        })
    }

    /// The process-wide provider, connected on first use.
    ///
    /// Later calls return the existing instance regardless of the `config`
    /// they pass; a differing URL is logged and otherwise ignored.
    pub async fn shared(config: &RedisConfig) -> Result<Arc<Self>> {
        let provider = SHARED
            .get_or_try_init(|| async { Self::connect(config.clone()).await.map(Arc::new) })
            .await?;

        if provider.config.url != config.url {
            warn!(
                requested = %config.url,
                "Shared Redis connection already initialized with a different url; reusing it"
            );
        }

        Ok(Arc::clone(provider))
    }

    async fn open(config: &RedisConfig) -> Result<SharedConnection> {
        if config.cluster {
            let client = ClusterClient::new(config.cluster_urls()?)
                .map_err(|e| RedisError::Cluster(e.to_string()))?;
            let conn = client
                .get_async_connection()
                .await
                .map_err(|e| RedisError::Cluster(e.to_string()))?;
            Ok(SharedConnection::Cluster(conn))
        } else {
            let conn = Self::open_manager(&config.connection_url()?).await?;
            Ok(SharedConnection::Standalone(conn))
        }
    }

    async fn open_manager(url: &str) -> Result<ConnectionManager> {
        let client = Client::open(url).map_err(|e| RedisError::Connection(e.to_string()))?;
        ConnectionManager::new(client)
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Whether the backend is a cluster.
    pub fn is_cluster(&self) -> bool {
        self.connection.is_cluster()
    }

    /// Handle bound to the configured logical database.
    pub fn database(&self) -> Database {
        Database::new(self.connection.clone(), self.config.database_index())
    }

    /// All backend nodes currently known.
    ///
    /// Re-read on every call: a cluster's membership can change between
    /// two invalidations.
    pub async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        match &self.connection {
            SharedConnection::Standalone(_) => {
                let primary = self.primary.clone().ok_or_else(|| {
                    RedisError::Config(format!(
                        "connection url {} does not name an endpoint",
                        self.config.url
                    ))
                })?;
                Ok(vec![primary])
            }
            SharedConnection::Cluster(_) => {
                let nodes: String = self
                    .connection
                    .query(redis::cmd("CLUSTER").arg("NODES"))
                    .await?;
                let mut endpoints: Vec<Endpoint> =
                    nodes.lines().filter_map(Endpoint::from_cluster_line).collect();
                endpoints.sort();
                endpoints.dedup();
                if endpoints.is_empty() {
                    return Err(RedisError::Cluster("CLUSTER NODES returned no usable nodes".into()));
                }
                let dropped = retain_known(&mut self.nodes.lock(), &endpoints);
                debug!(count = endpoints.len(), dropped, "Cluster topology read");
                Ok(endpoints)
            }
        }
    }

    /// Administrative handle for one node.
    ///
    /// The primary endpoint of a standalone deployment reuses the shared
    /// connection. Any other node gets a dedicated connection, opened on
    /// first request and cached until [`endpoints`](Self::endpoints) no
    /// longer reports the node.
    pub async fn server(&self, endpoint: &Endpoint) -> Result<Server> {
        let scan_count = self.config.scan_count;

        if let SharedConnection::Standalone(conn) = &self.connection
            && self.primary.as_ref() == Some(endpoint)
        {
            return Ok(Server::new(endpoint.clone(), conn.clone(), scan_count));
        }

        let cached = self.nodes.lock().get(endpoint).cloned();
        if let Some(conn) = cached {
            return Ok(Server::new(endpoint.clone(), conn, scan_count));
        }

        let url = self.config.node_url(endpoint)?;
        let conn = timeout(self.config.connection_timeout, Self::open_manager(&url))
            .await
            .map_err(|_| RedisError::Timeout)??;
        debug!(endpoint = %endpoint, "Opened admin connection");

        // Another task may have raced us here; keep whichever landed first.
        let conn = self
            .nodes
            .lock()
            .entry(endpoint.clone())
            .or_insert(conn)
            .clone();
        Ok(Server::new(endpoint.clone(), conn, scan_count))
    }

    /// Check if the connection is healthy.
    pub async fn health_check(&self) -> Result<()> {
        self.database()
            .ping()
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))
    }
}

/// Drop cached connections to nodes no longer in `known`. Returns how many
/// were dropped.
fn retain_known<V>(nodes: &mut HashMap<Endpoint, V>, known: &[Endpoint]) -> usize {
    let before = nodes.len();
    nodes.retain(|endpoint, _| known.contains(endpoint));
    before - nodes.len()
}
