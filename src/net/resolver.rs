// src/net/resolver.rs
// =============================================================================
// Hostname resolution seam.
//
// The guard never calls DNS directly; it asks a Resolver. Production uses
// the system resolver through tokio. Tests (and anyone auditing against a
// fixed hosts map) use StaticResolver, which never touches the network.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::time::Duration;

const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;

#[async_trait]
pub trait Resolver: Send + Sync {
    // Returns every address the host resolves to, in resolver order
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system (getaddrinfo via tokio). Each
/// lookup is bounded; a slow resolver fails like an unknown host.
#[derive(Debug, Clone, Copy)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = bounded(self.timeout, host, tokio::net::lookup_host((host, port))).await?;
        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        tracing::debug!(host, count = ips.len(), "resolved host");
        Ok(ips)
    }
}

async fn bounded<T>(timeout: Duration, host: &str, lookup: impl Future<Output = io::Result<T>>) -> io::Result<T> {
    match tokio::time::timeout(timeout, lookup).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(host, timeout_ms = timeout.as_millis() as u64, "dns lookup timed out");
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("resolving {host} timed out"),
            ))
        }
    }
}

/// A fixed hostname -> addresses map. Unknown hosts fail to resolve.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder-style insert; unparsable addresses are skipped
    pub fn with(mut self, host: &str, ips: &[&str]) -> Self {
        let parsed = ips.iter().filter_map(|ip| ip.parse().ok()).collect();
        self.hosts.insert(host.to_ascii_lowercase(), parsed);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown host {host}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_is_case_insensitive() {
        let resolver = StaticResolver::new().with("Example.COM", &["93.184.216.34"]);
        let ips = resolver.resolve("example.com", 443).await.unwrap();
        assert_eq!(ips, vec!["93.184.216.34".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_static_resolver_unknown_host() {
        let resolver = StaticResolver::new();
        assert!(resolver.resolve("missing.test", 80).await.is_err());
    }

    #[tokio::test]
    async fn test_static_resolver_empty_answer() {
        let resolver = StaticResolver::new().with("empty.test", &[]);
        assert!(resolver.resolve("empty.test", 80).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_lookup_times_out() {
        let stalled = std::future::pending::<io::Result<Vec<IpAddr>>>();
        let err = bounded(Duration::from_millis(20), "slow.test", stalled)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(err.to_string().contains("slow.test"));
    }

    #[tokio::test]
    async fn test_lookup_within_deadline_passes_through() {
        let answer = async { Ok::<_, io::Error>(vec!["93.184.216.34".parse::<IpAddr>().unwrap()]) };
        let ips = bounded(Duration::from_secs(1), "example.com", answer).await.unwrap();
        assert_eq!(ips.len(), 1);
    }
}
