//! Local link identity snapshot
//!
//! A [`Link`] captures what was observed about one local interface on a
//! single resolver pass: its hardware address plus the assigned v6/v4
//! addresses, if any. Links are replaced wholesale on every pass, never
//! partially mutated, and two links with identical fields are the same
//! observed state as far as change detection is concerned.

use serde::{Deserialize, Serialize};

/// Identity snapshot of a local network interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Hardware address; empty means "no link observed"
    pub mac: String,

    /// Assigned IPv6 address, if any
    pub ipv6: Option<String>,

    /// Assigned IPv4 address, if any
    pub ipv4: Option<String>,
}

impl Link {
    /// The unset link (empty hardware address, no assigned addresses)
    pub fn unset() -> Self {
        Self::default()
    }

    /// Whether this link is unset
    pub fn is_unset(&self) -> bool {
        self.mac.is_empty()
    }

    /// Build a link from an enumerated address list
    ///
    /// The first entry is the hardware address. Remaining entries are
    /// classified by syntax ('.' means v4, otherwise ':' means v6)
    /// because enumeration order beyond the first entry is not
    /// guaranteed by the underlying OS facilities. Lists that are empty
    /// or carry more than three entries yield the unset link.
    pub fn from_addrs(addrs: &[String]) -> Self {
        if addrs.is_empty() || addrs.len() > 3 {
            return Self::unset();
        }

        let mut link = Self {
            mac: addrs[0].clone(),
            ipv6: None,
            ipv4: None,
        };

        for addr in &addrs[1..] {
            if addr.contains('.') {
                if link.ipv4.is_none() {
                    link.ipv4 = Some(addr.clone());
                }
            } else if addr.contains(':') && link.ipv6.is_none() {
                link.ipv6 = Some(addr.clone());
            }
        }

        link
    }
}
