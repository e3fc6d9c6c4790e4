//! Test doubles and common utilities for watcher contract tests
//!
//! These doubles script the three collaborator seams so the tests can
//! drive the coordinator deterministically without touching the network.

#![allow(dead_code)]

use async_trait::async_trait;
use hostwatch_core::config::{InterfaceNames, WatchConfig};
use hostwatch_core::traits::{ExternalIpLookup, IpFamily, LinkEnumerator, ReachabilityFeed};
use hostwatch_core::{Error, HostEvent, Result};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Enumerator that always reports the same mapping
pub struct FixedEnumerator {
    mapping: BTreeMap<String, Vec<String>>,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
}

impl FixedEnumerator {
    pub fn new(mapping: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            mapping,
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay each pass; useful to guarantee the reachability task runs
    /// before the loop's first fetch
    pub fn with_delay(mapping: BTreeMap<String, Vec<String>>, delay: Duration) -> Self {
        Self {
            mapping,
            delay: Some(delay),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Build a mapping literal: interface name to address list
    pub fn mapping(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(name, addrs)| {
                (
                    name.to_string(),
                    addrs.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait]
impl LinkEnumerator for FixedEnumerator {
    async fn enumerate(&self) -> Result<BTreeMap<String, Vec<String>>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.mapping.clone())
    }
}

/// Enumerator whose underlying facility always fails
pub struct FailingEnumerator;

#[async_trait]
impl LinkEnumerator for FailingEnumerator {
    async fn enumerate(&self) -> Result<BTreeMap<String, Vec<String>>> {
        Err(Error::enumeration("simulated enumeration failure"))
    }
}

/// Lookup double with scripted per-family responses
///
/// Responses are consumed front to back; the last one repeats forever.
/// `Err(msg)` entries become HTTP errors.
pub struct ScriptedLookup {
    responses: Mutex<HashMap<IpFamily, VecDeque<std::result::Result<String, String>>>>,
    delay: Option<Duration>,
    v4_calls: Arc<AtomicUsize>,
    v6_calls: Arc<AtomicUsize>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            delay: None,
            v4_calls: Arc::new(AtomicUsize::new(0)),
            v6_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay each lookup; useful for in-flight cancellation tests
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn respond(
        self,
        family: IpFamily,
        responses: Vec<std::result::Result<&str, &str>>,
    ) -> Self {
        let queue = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        self.responses
            .lock()
            .unwrap()
            .insert(family, queue);
        self
    }

    pub fn calls(&self, family: IpFamily) -> usize {
        match family {
            IpFamily::V4 => self.v4_calls.load(Ordering::SeqCst),
            IpFamily::V6 => self.v6_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl ExternalIpLookup for ScriptedLookup {
    async fn lookup(&self, family: IpFamily) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match family {
            IpFamily::V4 => self.v4_calls.fetch_add(1, Ordering::SeqCst),
            IpFamily::V6 => self.v6_calls.fetch_add(1, Ordering::SeqCst),
        };

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&family)
            .ok_or_else(|| Error::lookup(format!("no script for {}", family)))?;

        let response = if queue.len() > 1 {
            queue.pop_front().unwrap_or(Err("script exhausted".to_string()))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or(Err("script exhausted".to_string()))
        };

        response.map_err(Error::http)
    }
}

/// Feed the test can push satisfied/unsatisfied observations into
pub struct ControlledFeed {
    rx: Mutex<Option<mpsc::UnboundedReceiver<bool>>>,
}

impl ControlledFeed {
    pub fn new() -> (Self, mpsc::UnboundedSender<bool>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl ReachabilityFeed for ControlledFeed {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = bool> + Send + 'static>> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Watcher configuration sized for tests: recognized names en0/en1,
/// one-second cycles
pub fn test_config() -> WatchConfig {
    let mut config = WatchConfig::default();
    config.interfaces = InterfaceNames::new("en0", "en1");
    config.poll.interval_secs = 1;
    config.poll.event_channel_capacity = 100;
    config
}

/// Collect every event currently queued on the receiver
pub fn drain_events(rx: &mut broadcast::Receiver<HostEvent>) -> Vec<HostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// External-address values observed for one family, in order
pub fn external_addresses(events: &[HostEvent], family: IpFamily) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            HostEvent::ExternalAddress {
                family: f,
                address,
            } if *f == family => Some(address.clone()),
            _ => None,
        })
        .collect()
}

/// Count the wired-link change events
pub fn wired_link_events(events: &[HostEvent]) -> Vec<hostwatch_core::Link> {
    events
        .iter()
        .filter_map(|event| match event {
            HostEvent::WiredLink { link } => Some(link.clone()),
            _ => None,
        })
        .collect()
}

/// Count the wireless-link change events
pub fn wireless_link_events(events: &[HostEvent]) -> Vec<hostwatch_core::Link> {
    events
        .iter()
        .filter_map(|event| match event {
            HostEvent::WirelessLink { link } => Some(link.clone()),
            _ => None,
        })
        .collect()
}
