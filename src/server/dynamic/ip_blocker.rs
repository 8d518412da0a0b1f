//! Dynamic IP blocklist.
//!
//! Each `blockIP` configuration row carries one exact address or CIDR block. The whole
//! list is rebuilt on every refresh and published as a single generation.

use arc_swap::ArcSwap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::error;

/// One parsed blocklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpRule {
    /// Matches a single address.
    Exact(IpAddr),
    /// Matches every address sharing the first `prefix` bits of `network`.
    Network { network: IpAddr, prefix: u8 },
}

impl IpRule {
    /// Parses an exact address (`10.1.2.3`) or a CIDR block (`10.0.0.0/8`, `fd00::/8`).
    ///
    /// # Returns
    /// - `Some(IpRule)` - Valid address or block, host bits of a block are cleared
    /// - `None` - Unparsable address or prefix longer than the address family allows
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        match value.split_once('/') {
            Some((addr, prefix)) => {
                let network: IpAddr = addr.trim().parse().ok()?;
                let network = network.to_canonical();
                let prefix: u8 = prefix.trim().parse().ok()?;
                let max = if network.is_ipv4() { 32 } else { 128 };
                if prefix > max {
                    return None;
                }
                Some(Self::Network {
                    network: mask(network, prefix),
                    prefix,
                })
            }
            None => value
                .parse::<IpAddr>()
                .ok()
                .map(|ip| Self::Exact(ip.to_canonical())),
        }
    }

    /// Checks whether the address falls under this rule.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        let ip = ip.to_canonical();
        match self {
            Self::Exact(addr) => *addr == ip,
            Self::Network { network, prefix } => {
                network.is_ipv4() == ip.is_ipv4() && mask(ip, *prefix) == *network
            }
        }
    }
}

fn mask(ip: IpAddr, prefix: u8) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = if prefix == 0 {
                0
            } else {
                u32::MAX << (32 - u32::from(prefix))
            };
            IpAddr::V4(Ipv4Addr::from(bits & mask))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let mask = if prefix == 0 {
                0
            } else {
                u128::MAX << (128 - u32::from(prefix))
            };
            IpAddr::V6(Ipv6Addr::from(bits & mask))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockedEntry {
    source: String,
    rule: IpRule,
}

/// Read-mostly IP blocklist replaced wholesale on refresh.
#[derive(Debug)]
pub struct IpBlocker {
    entries: ArcSwap<Vec<BlockedEntry>>,
}

impl IpBlocker {
    /// Creates an empty blocklist that blocks nothing.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Replaces the blocklist with the given raw entries.
    ///
    /// Unparsable entries are logged and skipped; the remaining entries are still
    /// installed. An empty slice clears the blocklist.
    ///
    /// # Arguments
    /// - `values` - Raw IP or CIDR strings, one per configuration row
    ///
    /// # Returns
    /// - `usize` - Number of entries installed
    pub fn reset(&self, values: &[String]) -> usize {
        let mut entries = Vec::with_capacity(values.len());

        for value in values {
            match IpRule::parse(value) {
                Some(rule) => entries.push(BlockedEntry {
                    source: value.trim().to_string(),
                    rule,
                }),
                None => error!(category = "blockIP", value = %value, "Invalid blocked IP entry"),
            }
        }

        let count = entries.len();
        self.entries.store(Arc::new(entries));
        count
    }

    /// Checks whether a client IP is blocked.
    ///
    /// Unparsable client IPs are never blocked.
    pub fn is_blocked(&self, ip: &str) -> bool {
        let Ok(ip) = ip.trim().parse::<IpAddr>() else {
            return false;
        };

        self.entries.load().iter().any(|entry| entry.rule.contains(&ip))
    }

    /// Raw strings of the installed entries, in configuration order.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .load()
            .iter()
            .map(|entry| entry.source.clone())
            .collect()
    }
}

impl Default for IpBlocker {
    fn default() -> Self {
        Self::new()
    }
}
