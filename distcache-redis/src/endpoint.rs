//! Backend node addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{RedisError, Result};

/// Default Redis port, used when a URL omits one.
pub const DEFAULT_PORT: u16 = 6379;

/// URL schemes that address a server through a unix socket.
pub(crate) const SOCKET_SCHEMES: &[&str] = &["unix", "redis+unix"];

/// Address of one backend node.
///
/// A standalone server exposes a single endpoint; a cluster exposes one per
/// node. IPv6 hosts are kept in bracketed form so the address can be spliced
/// back into a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Endpoint {
    /// Node reached over TCP.
    Tcp { host: String, port: u16 },
    /// Server reached through a local unix socket.
    Socket { path: String },
}

impl Endpoint {
    /// Create a TCP endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host
        };
        Self::Tcp { host, port }
    }

    /// Create a unix socket endpoint.
    pub fn socket(path: impl Into<String>) -> Self {
        Self::Socket { path: path.into() }
    }

    /// Extract the endpoint a connection URL points at.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;

        if SOCKET_SCHEMES.contains(&parsed.scheme()) {
            let path = parsed.path();
            if path.is_empty() || path == "/" {
                return Err(RedisError::Config(format!("socket url has no path: {}", url)));
            }
            return Ok(Self::socket(path));
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RedisError::Config(format!("connection url has no host: {}", url)))?;
        Ok(Self::new(host, parsed.port().unwrap_or(DEFAULT_PORT)))
    }

    /// Parse one line of `CLUSTER NODES` output.
    ///
    /// Returns `None` for nodes that cannot be scanned (`noaddr`, failed
    /// handshakes, nodes flagged `fail`) so callers can skip them.
    pub fn from_cluster_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let _id = fields.next()?;
        let address = fields.next()?;
        let flags = fields.next()?;

        if flags
            .split(',')
            .any(|f| matches!(f, "noaddr" | "handshake" | "fail"))
        {
            return None;
        }

        // ip:port@cport[,hostname]
        let address = address.split('@').next()?;
        let (host, port) = address.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port = port.parse().ok()?;
        Some(Self::new(host, port))
    }

    /// Host name or address, `None` for a socket.
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Tcp { host, .. } => Some(host),
            Self::Socket { .. } => None,
        }
    }

    /// TCP port, `None` for a socket.
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Tcp { port, .. } => Some(*port),
            Self::Socket { .. } => None,
        }
    }

    /// Whether this is a unix socket endpoint.
    pub fn is_socket(&self) -> bool {
        matches!(self, Self::Socket { .. })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Self::Socket { path } => write!(f, "unix:{}", path),
        }
    }
}

impl FromStr for Endpoint {
    type Err = RedisError;

    fn from_str(s: &str) -> Result<Self> {
        if s.contains("://") {
            return Self::from_url(s);
        }
        if let Some(path) = s.strip_prefix("unix:") {
            return Ok(Self::socket(path));
        }
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| RedisError::Config(format!("endpoint must be host:port, got {}", s)))?;
        let port = port
            .parse()
            .map_err(|_| RedisError::Config(format!("invalid port in endpoint {}", s)))?;
        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        let endpoint = Endpoint::from_url("redis://cache.internal:6380/2").unwrap();
        assert_eq!(endpoint.host(), Some("cache.internal"));
        assert_eq!(endpoint.port(), Some(6380));
        assert_eq!(endpoint.to_string(), "cache.internal:6380");
    }

    #[test]
    fn test_from_url_default_port() {
        let endpoint = Endpoint::from_url("redis://:secret@localhost").unwrap();
        assert_eq!(endpoint, Endpoint::new("localhost", DEFAULT_PORT));
    }

    #[test]
    fn test_from_str() {
        let endpoint: Endpoint = "10.0.0.5:7000".parse().unwrap();
        assert_eq!(endpoint, Endpoint::new("10.0.0.5", 7000));
        assert!("no-port".parse::<Endpoint>().is_err());
        assert!("host:port".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_ipv6_is_bracketed() {
        let endpoint = Endpoint::new("::1", 7001);
        assert_eq!(endpoint.to_string(), "[::1]:7001");
    }

    #[test]
    fn test_from_cluster_line() {
        let line = "07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30004@31004 slave e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 0 1426238317239 4 connected";
        let endpoint = Endpoint::from_cluster_line(line).unwrap();
        assert_eq!(endpoint, Endpoint::new("127.0.0.1", 30004));

        let with_hostname = "e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 10.0.0.1:30001@31001,node-a myself,master - 0 0 1 connected 0-5460";
        let endpoint = Endpoint::from_cluster_line(with_hostname).unwrap();
        assert_eq!(endpoint, Endpoint::new("10.0.0.1", 30001));
    }

    #[test]
    fn test_from_cluster_line_skips_noaddr() {
        let line = "6ec23923021cf3ffec47632106199cb7f496ce01 :0@0 master,noaddr - 0 0 5 disconnected";
        assert!(Endpoint::from_cluster_line(line).is_none());
        assert!(Endpoint::from_cluster_line("").is_none());
    }

    #[test]
    fn test_from_cluster_line_skips_failed_nodes() {
        let line = "a1e2c3d4e5f60718293a4b5c6d7e8f9012345678 10.0.0.9:30009@31009 master,fail - 1426238316232 1426238315000 7 disconnected";
        assert!(Endpoint::from_cluster_line(line).is_none());

        // Suspected failures are still reachable and keep being scanned
        let line = "a1e2c3d4e5f60718293a4b5c6d7e8f9012345678 10.0.0.9:30009@31009 master,fail? - 0 0 7 connected 0-100";
        assert_eq!(
            Endpoint::from_cluster_line(line),
            Some(Endpoint::new("10.0.0.9", 30009))
        );
    }

    #[test]
    fn test_socket_url() {
        let endpoint = Endpoint::from_url("redis+unix:///tmp/redis.sock").unwrap();
        assert_eq!(endpoint, Endpoint::socket("/tmp/redis.sock"));
        assert!(endpoint.is_socket());
        assert_eq!(endpoint.host(), None);
        assert_eq!(endpoint.to_string(), "unix:/tmp/redis.sock");

        let endpoint = Endpoint::from_url("unix:///var/run/redis.sock?db=3").unwrap();
        assert_eq!(endpoint, Endpoint::socket("/var/run/redis.sock"));

        assert_eq!("unix:/tmp/redis.sock".parse::<Endpoint>().unwrap(), Endpoint::socket("/tmp/redis.sock"));
    }
}
