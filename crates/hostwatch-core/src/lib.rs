// # hostwatch-core
//
// Core library for the hostwatch network-state observer.
//
// ## Architecture Overview
//
// This library provides the coordination logic for observing a host's
// network identity:
// - **LinkEnumerator**: Trait for enumerating local interfaces (name to
//   address-list mapping, hardware address first)
// - **ExternalIpLookup**: Trait for resolving the externally visible
//   address of one IP family
// - **ReachabilityFeed**: Trait for a push-driven satisfied/unsatisfied
//   path-status stream
// - **HostWatcher**: Coordinator that owns all tracked state, drives the
//   poll loop, and emits change events
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Platform I/O lives behind the traits;
//    this crate never touches sockets or syscalls itself
// 2. **Change Detection**: A state write that equals the prior value is
//    a no-op for notification purposes, for every tracked field
// 3. **Cooperative Cancellation**: The loop stops at checkpoints, never
//    by forced termination of in-flight work
// 4. **Library-First**: The watcher is an explicit instance owned by its
//    caller; there is no process-wide singleton

pub mod config;
pub mod error;
pub mod link;
pub mod traits;
pub mod watcher;

// Re-export core types for convenience
pub use config::{InterfaceNames, LookupConfig, PollConfig, WatchConfig};
pub use error::{Error, Result};
pub use link::Link;
pub use traits::{ExternalIpLookup, IpFamily, LinkEnumerator, ReachabilityFeed};
pub use watcher::{HostEvent, HostSnapshot, HostWatcher, RunState, INACTIVE_ADDR, PENDING_ADDR};
