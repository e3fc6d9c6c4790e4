// # Link Enumerator Trait
//
// Defines the interface for enumerating local network interfaces.
//
// ## Implementations
//
// - netdev-based (cross-platform): `hostwatch-link-netdev` crate
// - Test doubles: fixed mappings in the contract test suite

use async_trait::async_trait;
use std::collections::BTreeMap;

/// Trait for local interface enumeration
///
/// Implementations perform a one-shot enumeration pass and group the
/// discovered addresses by interface name, hardware address first. The
/// coordinator classifies the configured names into [`crate::Link`]
/// records; every other name in the mapping is ignored.
///
/// Implementations must be thread-safe and usable across async tasks.
/// An `Err` from `enumerate()` is non-fatal to callers: the coordinator
/// logs it and proceeds as if no interfaces were found.
#[async_trait]
pub trait LinkEnumerator: Send + Sync {
    /// Enumerate local interfaces
    ///
    /// # Returns
    ///
    /// - `Ok(mapping)`: interface name to address list, hardware address
    ///   first, assigned addresses after it in enumeration order
    /// - `Err(Error)`: the underlying enumeration facility failed
    async fn enumerate(&self) -> Result<BTreeMap<String, Vec<String>>, crate::Error>;
}
