//! In-process backend.
//!
//! Implements the connection seam without a server: a fixed set of simulated
//! nodes, each holding a shard of the keyspace. Expiry follows the tokio
//! clock, so tests can pause and advance time instead of sleeping.

use crate::error::{CacheError, CacheResult};
use crate::traits::{ConnectionProvider, DatabaseHandle, ServerHandle};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

type Shard = RwLock<HashMap<String, CacheEntry>>;

#[derive(Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// One simulated backend node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryNode(usize);

impl MemoryNode {
    /// Position of the node in the provider.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory-node-{}", self.0)
    }
}

/// In-memory connection provider.
///
/// With more than one node, keys are spread across nodes by hash, the same
/// way a cluster partitions its keyspace, so bulk operations have to visit
/// every node to be complete.
pub struct InMemoryProvider {
    shards: Arc<Vec<Shard>>,
}

impl InMemoryProvider {
    /// Create a single-node provider.
    pub fn new() -> Self {
        Self::with_nodes(1)
    }

    /// Create a provider simulating `nodes` backend nodes (at least one).
    pub fn with_nodes(nodes: usize) -> Self {
        let shards = (0..nodes.max(1)).map(|_| RwLock::new(HashMap::new())).collect();
        Self {
            shards: Arc::new(shards),
        }
    }

    /// Number of live (unexpired) entries across all nodes.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let mut total = 0;
        for shard in self.shards.iter() {
            total += shard.read().await.values().filter(|e| e.is_live(now)).count();
        }
        total
    }

    /// Whether no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of live entries stored on one node.
    pub async fn node_len(&self, node: MemoryNode) -> usize {
        let now = Instant::now();
        match self.shards.get(node.0) {
            Some(shard) => shard.read().await.values().filter(|e| e.is_live(now)).count(),
            None => 0,
        }
    }

    /// Drop expired entries. Returns how many were removed.
    ///
    /// Reads already treat expired entries as absent; this only reclaims
    /// memory.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        for shard in self.shards.iter() {
            let mut data = shard.write().await;
            let before = data.len();
            data.retain(|_, entry| entry.is_live(now));
            purged += before - data.len();
        }
        purged
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionProvider for InMemoryProvider {
    type Endpoint = MemoryNode;
    type Database = MemoryDatabase;
    type Server = MemoryServer;

    fn database(&self) -> CacheResult<MemoryDatabase> {
        Ok(MemoryDatabase {
            shards: Arc::clone(&self.shards),
        })
    }

    async fn endpoints(&self) -> CacheResult<Vec<MemoryNode>> {
        Ok((0..self.shards.len()).map(MemoryNode).collect())
    }

    async fn server(&self, endpoint: &MemoryNode) -> CacheResult<MemoryServer> {
        if endpoint.0 >= self.shards.len() {
            return Err(CacheError::Connection(format!("unknown endpoint {}", endpoint)));
        }
        Ok(MemoryServer {
            shards: Arc::clone(&self.shards),
            node: *endpoint,
        })
    }
}

/// Database handle of an [`InMemoryProvider`].
#[derive(Clone)]
pub struct MemoryDatabase {
    shards: Arc<Vec<Shard>>,
}

impl MemoryDatabase {
    fn shard(&self, key: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}

#[async_trait]
impl DatabaseHandle for MemoryDatabase {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let data = self.shard(key).read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let entry = CacheEntry {
            value: payload,
            expires_at: Some(Instant::now() + ttl),
        };
        self.shard(key).write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.get(key).await.map(|v| v.is_some())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut data = self.shard(key).write().await;
        Ok(data
            .remove(key)
            .is_some_and(|entry| entry.is_live(Instant::now())))
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let data = self.shard(key).read().await;
        let now = Instant::now();
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at)
            .map(|exp| exp - now))
    }
}

/// Administrative handle for one node of an [`InMemoryProvider`].
pub struct MemoryServer {
    shards: Arc<Vec<Shard>>,
    node: MemoryNode,
}

impl MemoryServer {
    /// The node this handle scans.
    pub fn node(&self) -> MemoryNode {
        self.node
    }
}

#[async_trait]
impl ServerHandle for MemoryServer {
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let matcher = glob_to_regex(pattern)?;
        let now = Instant::now();
        let data = self.shards[self.node.0].read().await;
        let mut keys: Vec<String> = data
            .iter()
            .filter(|(key, entry)| entry.is_live(now) && matcher.is_match(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Translate a Redis glob (`*`, `?`, `[...]`, `\x`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> CacheResult<Regex> {
    let mut re = String::from("(?s)^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => re.push_str(&regex::escape(&escaped.to_string())),
                None => re.push_str(&regex::escape("\\")),
            },
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if chars.peek() == Some(&'^') {
                    chars.next();
                    class.push('^');
                }
                while let Some(c) = chars.next() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                push_class_char(&mut class, escaped);
                            }
                        }
                        '-' => class.push('-'),
                        other => push_class_char(&mut class, other),
                    }
                }
                if !closed || class.is_empty() || class == "^" {
                    return Err(CacheError::InvalidPattern(pattern.to_string()));
                }
                re.push('[');
                re.push_str(&class);
                re.push(']');
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }

    re.push('$');
    Regex::new(&re).map_err(|e| CacheError::InvalidPattern(e.to_string()))
}

fn push_class_char(class: &mut String, c: char) {
    if c.is_alphanumeric() {
        class.push(c);
    } else {
        class.push('\\');
        class.push(c);
    }
}
