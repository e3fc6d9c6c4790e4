//! Trait seams for the hostwatch system
//!
//! These traits isolate the platform collaborators (interface
//! enumeration, external lookups, path monitoring) from the
//! coordination logic in [`crate::watcher`].

pub mod external_ip;
pub mod link_enumerator;
pub mod reachability;

pub use external_ip::{ExternalIpLookup, IpFamily};
pub use link_enumerator::LinkEnumerator;
pub use reachability::ReachabilityFeed;
