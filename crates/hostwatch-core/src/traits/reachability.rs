// # Reachability Feed Trait
//
// Defines the interface for the path-status feed: a push-driven stream
// of satisfied/unsatisfied observations.
//
// ## Implementations
//
// - Route probe (cross-platform): `hostwatch-path-probe` crate
// - Test doubles: channel-backed feeds in the contract test suite

use std::pin::Pin;
use tokio_stream::Stream;

/// Trait for path-status feed implementations
///
/// The feed never errors in-contract: loss of connectivity is modeled as
/// an `false` item, not as a failure. Implementations should deduplicate
/// at the source and yield an item only when the status actually flips
/// (plus the initial observation), though the coordinator applies its
/// own change detection as well.
pub trait ReachabilityFeed: Send + Sync {
    /// Watch for path-status changes
    ///
    /// Returns a stream yielding `true` when the host has a usable
    /// network path and `false` when it does not.
    ///
    /// # Behavior
    ///
    /// - Should yield the initial status promptly when first polled
    /// - Must be cancellation-safe (dropping the stream cleans up any
    ///   background resources)
    fn watch(&self) -> Pin<Box<dyn Stream<Item = bool> + Send + 'static>>;
}
