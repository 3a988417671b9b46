//! Per-node administrative handle.

use redis::aio::ConnectionManager;
use std::collections::BTreeSet;
use tracing::debug;

use crate::{Endpoint, Result};

/// Administrative handle for one backend node.
///
/// Used for key enumeration only. Keys are read with cursor-based `SCAN`,
/// never `KEYS`, so a large keyspace does not block the server.
#[derive(Clone)]
pub struct Server {
    endpoint: Endpoint,
    conn: ConnectionManager,
    scan_count: usize,
}

impl Server {
    pub(crate) fn new(endpoint: Endpoint, conn: ConnectionManager, scan_count: usize) -> Self {
        Self {
            endpoint,
            conn,
            scan_count,
        }
    }

    /// The node this handle talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Snapshot of the keys on this node matching a glob `pattern`.
    ///
    /// The scan is not isolated from concurrent writers: keys created or
    /// removed while the cursor advances may or may not appear. Duplicates
    /// reported by `SCAN` across rehashes are collapsed.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = BTreeSet::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(endpoint = %self.endpoint, pattern = %pattern, matched = keys.len(), "SCAN complete");
        Ok(keys.into_iter().collect())
    }
}
