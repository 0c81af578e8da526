// crates/scanner/src/discovery.rs
//! TCP connect discovery

use anyhow::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, instrument};

use httpscan_common::{Discovery, ScanOptions, Target};
use httpscan_target_resolver::TargetResolver;

/// Finds hosts with the target port open using plain TCP connects.
pub struct TcpDiscovery {
    timeout: Duration,
    fast_timeout: Duration,
    concurrency: usize,
    fast_concurrency: usize,
}

impl TcpDiscovery {
    /// Create a new discovery with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take connect timeouts and fan-out from scan options.
    pub fn from_options(options: &ScanOptions) -> Self {
        let fast = ScanOptions::fast();
        Self {
            timeout: options.connect_timeout,
            fast_timeout: fast.connect_timeout.min(options.connect_timeout),
            concurrency: options.discovery_concurrency.max(1),
            fast_concurrency: fast
                .discovery_concurrency
                .max(options.discovery_concurrency)
                .max(1),
        }
    }

    /// Set connect timeout for normal timing.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `addr` accepts a TCP connection within `connect_timeout`.
    /// One attempt only.
    #[instrument(skip(connect_timeout))]
    async fn is_open(addr: SocketAddr, connect_timeout: Duration) -> bool {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("connect {} failed: {}", addr, e);
                false
            }
            Err(_) => {
                debug!("connect {} timed out", addr);
                false
            }
        }
    }
}

impl Default for TcpDiscovery {
    fn default() -> Self {
        Self::from_options(&ScanOptions::default())
    }
}

#[async_trait]
impl Discovery for TcpDiscovery {
    async fn discover(&self, target_spec: &str, port: u16, fast: bool) -> Result<Vec<Target>> {
        let ips = TargetResolver::resolve_targets(target_spec).await?;
        let total = ips.len();
        let start = Instant::now();

        let (connect_timeout, concurrency) = if fast {
            (self.fast_timeout, self.fast_concurrency)
        } else {
            (self.timeout, self.concurrency)
        };

        let permits = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();
        for (index, ip) in ips.into_iter().enumerate() {
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                let addr = SocketAddr::new(ip, port);
                if Self::is_open(addr, connect_timeout).await {
                    Some((index, Target::new(ip, port)))
                } else {
                    None
                }
            });
        }

        let mut open = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Some(found) = joined? {
                open.push(found);
            }
        }
        open.sort_by_key(|(index, _)| *index);

        debug!(
            "{} hosts up, {} total in {:.2}s",
            open.len(),
            total,
            start.elapsed().as_secs_f64()
        );

        Ok(open.into_iter().map(|(_, target)| target).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_discovers_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let discovery = TcpDiscovery::new().with_timeout(Duration::from_secs(1));
        let found = discovery.discover("127.0.0.1", port, false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].port, port);
        assert_eq!(found[0].ip.to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_closed_port_is_skipped() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let discovery = TcpDiscovery::new().with_timeout(Duration::from_millis(300));
        let found = discovery.discover("127.0.0.1", port, true).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_spec_is_an_error() {
        let discovery = TcpDiscovery::new();
        assert!(discovery.discover("", 80, false).await.is_err());
    }

    #[test]
    fn test_fast_timing_is_tighter() {
        let discovery = TcpDiscovery::from_options(&ScanOptions::default());
        assert!(discovery.fast_timeout <= discovery.timeout);
        assert!(discovery.fast_concurrency >= discovery.concurrency);
    }
}
