// # netdev Link Enumerator
//
// This crate enumerates local network interfaces through the `netdev`
// crate and exposes them as the name-to-address-list mapping the
// coordinator classifies.
//
// ## Mapping shape
//
// Per interface: hardware address first (when the platform reports
// one), then assigned v6 addresses, then assigned v4 addresses. The
// coordinator does not rely on this ordering beyond "hardware address
// first"; assigned addresses are reclassified by syntax.
//
// ## Blocking
//
// `netdev::get_interfaces()` performs blocking syscalls, so the pass
// runs on the blocking thread pool.

use async_trait::async_trait;
use hostwatch_core::traits::LinkEnumerator;
use hostwatch_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Interface enumeration over the `netdev` crate
#[derive(Debug, Default)]
pub struct NetdevEnumerator;

impl NetdevEnumerator {
    /// Create a new enumerator
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkEnumerator for NetdevEnumerator {
    async fn enumerate(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let interfaces = tokio::task::spawn_blocking(netdev::get_interfaces)
            .await
            .map_err(|e| Error::enumeration(format!("enumeration task failed: {}", e)))?;

        let mut mapping = BTreeMap::new();
        for iface in interfaces {
            let mut addrs = Vec::new();

            if let Some(mac) = iface.mac_addr {
                let o = mac.octets();
                addrs.push(format!(
                    "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                    o[0], o[1], o[2], o[3], o[4], o[5]
                ));
            }
            for net in &iface.ipv6 {
                addrs.push(net.addr().to_string());
            }
            for net in &iface.ipv4 {
                addrs.push(net.addr().to_string());
            }

            mapping.insert(iface.name, addrs);
        }

        debug!(interfaces = mapping.len(), "enumeration pass complete");
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enumeration_returns_a_mapping() {
        // Shape-only check: every reported interface has a name and its
        // address list starts with the hardware address when non-empty.
        let mapping = NetdevEnumerator::new().enumerate().await.unwrap();
        for (name, addrs) in &mapping {
            assert!(!name.is_empty());
            if let Some(first) = addrs.first() {
                assert!(!first.is_empty());
            }
        }
    }
}
