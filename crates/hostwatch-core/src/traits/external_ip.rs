// # External IP Lookup Trait
//
// Defines the interface for resolving the host's externally visible
// address for one IP family.
//
// ## Implementations
//
// - HTTPS IP-echo service: `hostwatch-ip-http` crate
// - Test doubles: scripted responses in the contract test suite

use async_trait::async_trait;

/// IP address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl std::fmt::Display for IpFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "v4"),
            IpFamily::V6 => write!(f, "v6"),
        }
    }
}

/// Trait for external address lookups
///
/// One call performs one lookup against the family-specific endpoint.
/// Reachability gating, sentinel values, and change detection are the
/// coordinator's responsibility, not the lookup's: implementations
/// simply return the resolved address string or an error. The
/// coordinator swallows errors and retains the prior value, so a
/// transient failure never overwrites observed state.
#[async_trait]
pub trait ExternalIpLookup: Send + Sync {
    /// Resolve the external address for one family
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the address as reported by the lookup service
    /// - `Err(Error)`: transport failure, non-success status, or a
    ///   malformed response body
    async fn lookup(&self, family: IpFamily) -> Result<String, crate::Error>;
}
