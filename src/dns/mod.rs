//! Destination name resolution
//!
//! IP literals are used as-is; hostnames go through the system resolver
//! configuration (or trust-dns defaults when the system configuration cannot
//! be read).

use crate::error::{AppError, Result};
use std::net::{IpAddr, Ipv4Addr};
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf,
    TokioAsyncResolver,
};

/// Resolves probe destinations to IPv4 addresses
#[derive(Clone)]
pub struct DnsManager {
    resolver: TokioAsyncResolver,
}

impl DnsManager {
    /// Create a resolver from the host's DNS configuration
    pub fn new() -> Self {
        let (config, opts) = system_conf::read_system_conf()
            .unwrap_or_else(|_| (ResolverConfig::default(), ResolverOpts::default()));
        Self::with_config(config, opts)
    }

    /// Create a resolver with explicit configuration
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// Resolve a destination to the address that will be probed.
    ///
    /// Prefers the first IPv4 address; an IPv6-only answer is returned as-is
    /// so the caller can report it as unsupported.
    pub async fn resolve(&self, host: &str) -> Result<IpAddr> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(ip);
        }

        let response = self.resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::dns_resolution(format!("DNS lookup failed for {}: {}", host, e)))?;

        let addresses: Vec<IpAddr> = response.iter().collect();
        pick_address(&addresses)
            .ok_or_else(|| AppError::dns_resolution(format!("No addresses resolved for {}", host)))
    }
}

impl Default for DnsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an IP literal, accepting bracketed IPv6 forms
pub fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    let trimmed = host.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed.parse::<IpAddr>().ok()
}

/// First IPv4 address if any, otherwise the first address
fn pick_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
}

/// Convenience check used by config validation and the transport
pub fn as_ipv4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}
