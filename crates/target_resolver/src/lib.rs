//! Target Resolver - range, CIDR and hostname expansion
//!
//! Takes a comma-separated target string and expands it into a
//! deduplicated list of IPv4 addresses, preserving first-seen order.
//! Supported token forms:
//! - single IPv4 address: "1.2.3.4"
//! - last-octet range: "192.168.1.1-254"
//! - full range: "192.168.1.1-192.168.1.10"
//! - CIDR: "192.168.1.0/24"
//! - hostname: "example.com"

use anyhow::{Context, Result};
use ipnet::Ipv4Net;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use tracing::debug;

/// Hosts a single token may expand to unless `HTTPSCAN_ALLOW_LARGE_CIDR=1`.
pub const MAX_HOSTS: u128 = 4096;

pub struct TargetResolver;

impl TargetResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a comma-separated target string into unique IPv4 addresses.
    /// DNS resolution runs inside `spawn_blocking`.
    pub async fn resolve_targets(targets: &str) -> Result<Vec<IpAddr>> {
        if targets.trim().is_empty() {
            anyhow::bail!("No targets specified");
        }

        let allow_large = std::env::var("HTTPSCAN_ALLOW_LARGE_CIDR")
            .map(|v| v == "1")
            .unwrap_or(false);

        let mut ips: Vec<IpAddr> = Vec::new();
        let mut hostnames: Vec<String> = Vec::new();

        for token in targets.split(',') {
            let t = token.trim();
            if t.is_empty() {
                continue;
            }

            if let Ok(net) = t.parse::<Ipv4Net>() {
                let prefix = net.prefix_len();
                let hosts_count = if prefix >= 32 { 1u128 } else { 1u128 << (32 - prefix) };
                if hosts_count > MAX_HOSTS && !allow_large {
                    anyhow::bail!(
                        "CIDR {} expands to {} hosts which exceeds the allowed limit of {}. Set HTTPSCAN_ALLOW_LARGE_CIDR=1 to override.",
                        net,
                        hosts_count,
                        MAX_HOSTS
                    );
                }
                for addr in net.hosts() {
                    push_unique(&mut ips, IpAddr::V4(addr));
                }
                continue;
            }

            if t.contains('-') && t.chars().any(|c| c.is_ascii_digit()) {
                if let Ok(range_ips) = parse_ip_range(t) {
                    if range_ips.len() as u128 > MAX_HOSTS && !allow_large {
                        anyhow::bail!(
                            "Range {} expands to {} hosts which exceeds the allowed limit of {}. Set HTTPSCAN_ALLOW_LARGE_CIDR=1 to override.",
                            t,
                            range_ips.len(),
                            MAX_HOSTS
                        );
                    }
                    for ip in range_ips {
                        push_unique(&mut ips, ip);
                    }
                    continue;
                }
            }

            if let Ok(ip) = t.parse::<IpAddr>() {
                if ip.is_ipv4() {
                    push_unique(&mut ips, ip);
                }
                continue;
            }

            hostnames.push(t.to_string());
        }

        if !hostnames.is_empty() {
            let host_batch = hostnames.clone();
            let resolved: Vec<Vec<IpAddr>> = tokio::task::spawn_blocking(move || {
                host_batch
                    .into_iter()
                    .map(|h| match (h.as_str(), 0).to_socket_addrs() {
                        Ok(addrs) => addrs
                            .filter(|a| a.ip().is_ipv4())
                            .map(|a| a.ip())
                            .collect::<Vec<IpAddr>>(),
                        Err(e) => {
                            debug!("Unable to resolve {}: {}", h, e);
                            Vec::new()
                        }
                    })
                    .collect()
            })
            .await
            .context("Blocking DNS resolution failed")?;

            for ip in resolved.into_iter().flatten() {
                push_unique(&mut ips, ip);
            }
        }

        if ips.is_empty() {
            anyhow::bail!("No valid IPv4 addresses found in targets");
        }

        Ok(ips)
    }
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn push_unique(ips: &mut Vec<IpAddr>, ip: IpAddr) {
    if !ips.contains(&ip) {
        ips.push(ip);
    }
}

/// Parse `a.b.c.d-e.f.g.h` or the short form `a.b.c.d-N` (last octet only).
fn parse_ip_range(range: &str) -> Result<Vec<IpAddr>> {
    let parts: Vec<&str> = range.split('-').map(str::trim).collect();
    if parts.len() != 2 {
        anyhow::bail!("Invalid IP range: {}", range);
    }

    let start: Ipv4Addr = parts[0]
        .parse()
        .with_context(|| format!("Invalid start IP: {}", parts[0]))?;

    let end: Ipv4Addr = if parts[1].contains('.') {
        parts[1]
            .parse()
            .with_context(|| format!("Invalid end IP: {}", parts[1]))?
    } else {
        let last: u8 = parts[1]
            .parse()
            .with_context(|| format!("Invalid end octet: {}", parts[1]))?;
        let [a, b, c, _] = start.octets();
        Ipv4Addr::new(a, b, c, last)
    };

    let start_u32 = u32::from(start);
    let end_u32 = u32::from(end);
    if start_u32 > end_u32 {
        anyhow::bail!("Invalid IP range: start > end");
    }

    Ok((start_u32..=end_u32)
        .map(|v| IpAddr::V4(Ipv4Addr::from(v)))
        .collect())
}
