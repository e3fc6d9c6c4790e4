//! Host state coordinator and poll loop
//!
//! The HostWatcher is responsible for:
//! - Owning all tracked state (reachability, links, external addresses)
//! - Applying change detection before every state write
//! - Driving the repeating resolve/fetch cycle under cooperative stop
//! - Fanning change events out to subscribers
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ReachabilityFeed │── satisfied/unsatisfied ──┐
//! └──────────────────┘                           ▼
//! ┌──────────────────┐                  ┌───────────────┐
//! │  LinkEnumerator  │── name→addrs ───▶│  HostWatcher  │──▶ HostEvent
//! └──────────────────┘                  └───────────────┘   subscribers
//! ┌──────────────────┐                           ▲
//! │ ExternalIpLookup │── address per family ─────┘
//! └──────────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. `start()` resolves links once, then enters the loop
//! 2. Each cycle fetches both address families concurrently
//! 3. The loop sleeps the fixed interval (or wakes early on `stop()`)
//! 4. At the checkpoint: stop requested → finalize; otherwise re-resolve
//!    links and go again
//!
//! Fetch failures never terminate the loop; the only way out is the
//! cooperative stop flag.

use crate::config::WatchConfig;
use crate::link::Link;
use crate::traits::{ExternalIpLookup, IpFamily, LinkEnumerator, ReachabilityFeed};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Sentinel published while the first-ever lookup for a family is in flight
pub const PENDING_ADDR: &str = "pending";

/// Sentinel published when the host is unreachable
pub const INACTIVE_ADDR: &str = "inactive";

/// Events emitted by the HostWatcher
///
/// Each variant carries the new value of the field it describes. An
/// event fires at most once per actual change; a write equal to the
/// current value is silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Path reachability flipped
    Reachability { reachable: bool },

    /// The primary wired link changed
    WiredLink { link: Link },

    /// The primary wireless link changed
    WirelessLink { link: Link },

    /// An external address changed (resolved value or sentinel)
    ExternalAddress { family: IpFamily, address: String },

    /// Watcher started
    Started,

    /// Watcher stopped
    Stopped { reason: String },
}

/// Watcher lifecycle state
///
/// Legal transitions are NotRunning → Running → Stopped → Running; a
/// restart after a cooperative stop is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotRunning,
    Running,
    Stopped,
}

/// Read-only copy of the tracked state, for polling consumers
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HostSnapshot {
    /// Whether the host currently has a usable network path
    pub reachable: bool,
    /// Primary wired link identity
    pub wired: Link,
    /// Primary wireless link identity
    pub wireless: Link,
    /// Externally visible IPv4 address (or sentinel, or empty)
    pub external_v4: String,
    /// Externally visible IPv6 address (or sentinel, or empty)
    pub external_v6: String,
    /// Current lifecycle state
    pub run_state: RunState,
}

/// All mutable tracked state, behind one mutex
///
/// Per-field write serialization is all the concurrency discipline the
/// fields need; holding the lock across an await is never allowed here.
struct Shared {
    reachable: bool,
    wired: Link,
    wireless: Link,
    external_v4: String,
    external_v6: String,
    run_state: RunState,
}

impl Shared {
    fn new() -> Self {
        Self {
            // "not yet known" is treated as unreachable until the first
            // feed observation arrives
            reachable: false,
            wired: Link::unset(),
            wireless: Link::unset(),
            external_v4: String::new(),
            external_v6: String::new(),
            run_state: RunState::NotRunning,
        }
    }
}

/// Host network-state coordinator
///
/// The watcher is an explicit instance owned by its caller. It is
/// cheaply cloneable; clones share the same state and event channel.
///
/// ## Lifecycle
///
/// 1. Create with [`HostWatcher::new()`]
/// 2. Subscribe with [`HostWatcher::subscribe()`] (before `start()` to
///    observe the initial transitions)
/// 3. Start with [`HostWatcher::start()`]
/// 4. Stop cooperatively with [`HostWatcher::stop()`]; `start()` may be
///    called again afterwards
#[derive(Clone)]
pub struct HostWatcher {
    /// Local interface enumeration
    links: Arc<dyn LinkEnumerator>,

    /// External address lookups
    lookup: Arc<dyn ExternalIpLookup>,

    /// Path-status feed
    reachability: Arc<dyn ReachabilityFeed>,

    /// Validated configuration
    config: Arc<WatchConfig>,

    /// Tracked state
    shared: Arc<Mutex<Shared>>,

    /// Change-event fan-out
    event_tx: broadcast::Sender<HostEvent>,

    /// Cooperative stop flag, checked at loop checkpoints
    stop_tx: Arc<watch::Sender<bool>>,
}

impl HostWatcher {
    /// Create a new watcher
    ///
    /// # Parameters
    ///
    /// - `links`: interface enumeration implementation
    /// - `lookup`: external address lookup implementation
    /// - `reachability`: path-status feed implementation
    /// - `config`: watcher configuration (validated here)
    pub fn new(
        links: Arc<dyn LinkEnumerator>,
        lookup: Arc<dyn ExternalIpLookup>,
        reachability: Arc<dyn ReachabilityFeed>,
        config: WatchConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(config.poll.event_channel_capacity);
        let (stop_tx, _) = watch::channel(false);

        Ok(Self {
            links,
            lookup,
            reachability,
            config: Arc::new(config),
            shared: Arc::new(Mutex::new(Shared::new())),
            event_tx,
            stop_tx: Arc::new(stop_tx),
        })
    }

    /// Subscribe to change events
    ///
    /// Any number of subscribers is supported; each receives every event
    /// emitted after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.event_tx.subscribe()
    }

    /// Read-only copy of the current state
    pub fn snapshot(&self) -> HostSnapshot {
        let shared = self.shared_lock();
        HostSnapshot {
            reachable: shared.reachable,
            wired: shared.wired.clone(),
            wireless: shared.wireless.clone(),
            external_v4: shared.external_v4.clone(),
            external_v6: shared.external_v6.clone(),
            run_state: shared.run_state,
        }
    }

    /// Current lifecycle state
    pub fn run_state(&self) -> RunState {
        self.shared_lock().run_state
    }

    /// Start the watcher
    ///
    /// Spawns the reachability task and the poll loop. Calling `start()`
    /// while already running does not spawn a second loop; it performs
    /// the immediate one-shot resolve+fetch and returns.
    pub fn start(&self) {
        {
            let mut shared = self.shared_lock();
            if shared.run_state == RunState::Running {
                drop(shared);
                debug!("start() while running, refreshing once");
                let this = self.clone();
                tokio::spawn(async move {
                    this.refresh_links().await;
                    this.fetch_pair().await;
                });
                return;
            }
            shared.run_state = RunState::Running;
        }

        self.stop_tx.send_replace(false);
        self.emit(HostEvent::Started);
        info!(
            interval_secs = self.config.poll.interval_secs,
            "starting host watcher"
        );

        let this = self.clone();
        tokio::spawn(async move { this.run_reachability().await });

        let this = self.clone();
        tokio::spawn(async move { this.run_loop().await });
    }

    /// Request a cooperative stop
    ///
    /// Takes effect at the next loop checkpoint: the in-flight fetch
    /// pair completes, the sleep is cut short, and the loop finalizes
    /// with `RunState::Stopped`. Not instantaneous by design.
    pub fn stop(&self) {
        info!("stop requested");
        self.stop_tx.send_replace(true);
    }

    /// Forward path-status observations into the tracked state
    async fn run_reachability(&self) {
        let mut feed = self.reachability.watch();
        let mut stop_rx = self.stop_tx.subscribe();

        loop {
            tokio::select! {
                status = feed.next() => match status {
                    Some(reachable) => self.set_reachable(reachable),
                    None => {
                        warn!("reachability feed ended");
                        break;
                    }
                },
                _ = stop_rx.wait_for(|stop| *stop) => break,
            }
        }
    }

    /// The poll loop: resolve once, then fetch/sleep/checkpoint cycles
    async fn run_loop(&self) {
        let interval = Duration::from_secs(self.config.poll.interval_secs);
        let mut stop_rx = self.stop_tx.subscribe();

        self.refresh_links().await;

        loop {
            self.fetch_pair().await;

            // the sleep is the only point the stop flag cuts short;
            // in-flight fetches above always run to completion
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stop_rx.wait_for(|stop| *stop) => {}
            }

            if *stop_rx.borrow() {
                break;
            }

            self.refresh_links().await;
        }

        // a restart may have raced this shutdown; only finalize if the
        // stop request is still standing
        let finalize = *stop_rx.borrow();
        if finalize {
            self.shared_lock().run_state = RunState::Stopped;
            info!("host watcher stopped");
            self.emit(HostEvent::Stopped {
                reason: "stop requested".to_string(),
            });
        }
    }

    /// Fetch both address families concurrently
    ///
    /// No ordering guarantee between the two; both complete (or fail)
    /// before the caller proceeds.
    async fn fetch_pair(&self) {
        tokio::join!(
            self.fetch_external(IpFamily::V4),
            self.fetch_external(IpFamily::V6),
        );
    }

    /// Resolve one external address and write it with change detection
    async fn fetch_external(&self, family: IpFamily) {
        let (reachable, first_attempt) = {
            let shared = self.shared_lock();
            let slot = match family {
                IpFamily::V4 => &shared.external_v4,
                IpFamily::V6 => &shared.external_v6,
            };
            (shared.reachable, slot.is_empty())
        };

        if !reachable {
            self.set_external(family, INACTIVE_ADDR.to_string());
            return;
        }

        if first_attempt {
            self.set_external(family, PENDING_ADDR.to_string());
        }

        match self.lookup.lookup(family).await {
            Ok(address) => self.set_external(family, address),
            Err(e) => {
                // prior value retained; failures surface only here
                warn!(%family, error = %e, "external lookup failed");
            }
        }
    }

    /// Enumerate interfaces and reclassify the configured links
    ///
    /// Enumeration failure is treated as "no interfaces found". An
    /// absent configured name produces no write at all, so no event can
    /// fire for it.
    async fn refresh_links(&self) {
        let mapping = match self.links.enumerate().await {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(error = %e, "interface enumeration failed");
                BTreeMap::new()
            }
        };

        if let Some(addrs) = mapping.get(&self.config.interfaces.wired) {
            self.set_wired(Link::from_addrs(addrs));
        }
        if let Some(addrs) = mapping.get(&self.config.interfaces.wireless) {
            self.set_wireless(Link::from_addrs(addrs));
        }
    }

    fn set_reachable(&self, reachable: bool) {
        let mut shared = self.shared_lock();
        if shared.reachable == reachable {
            return;
        }
        shared.reachable = reachable;
        debug!(reachable, "reachability changed");
        let _ = self.event_tx.send(HostEvent::Reachability { reachable });
    }

    fn set_wired(&self, link: Link) {
        let mut shared = self.shared_lock();
        if shared.wired == link {
            return;
        }
        shared.wired = link.clone();
        debug!(mac = %link.mac, "wired link changed");
        let _ = self.event_tx.send(HostEvent::WiredLink { link });
    }

    fn set_wireless(&self, link: Link) {
        let mut shared = self.shared_lock();
        if shared.wireless == link {
            return;
        }
        shared.wireless = link.clone();
        debug!(mac = %link.mac, "wireless link changed");
        let _ = self.event_tx.send(HostEvent::WirelessLink { link });
    }

    fn set_external(&self, family: IpFamily, address: String) {
        let mut shared = self.shared_lock();
        let slot = match family {
            IpFamily::V4 => &mut shared.external_v4,
            IpFamily::V6 => &mut shared.external_v6,
        };
        if *slot == address {
            return;
        }
        *slot = address.clone();
        debug!(%family, %address, "external address changed");
        let _ = self
            .event_tx
            .send(HostEvent::ExternalAddress { family, address });
    }

    /// Emit a lifecycle event; no subscribers is not an error
    fn emit(&self, event: HostEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Lock the shared state, recovering from a poisoned mutex
    ///
    /// No critical section here can leave the state inconsistent, so a
    /// panic in another holder is safe to recover from.
    fn shared_lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
