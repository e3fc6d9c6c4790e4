//! Configuration types for the hostwatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Names of the two links of interest
    pub interfaces: InterfaceNames,

    /// External address lookup settings
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Poll loop settings
    #[serde(default)]
    pub poll: PollConfig,
}

impl WatchConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            interfaces: InterfaceNames::default(),
            lookup: LookupConfig::default(),
            poll: PollConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.interfaces.validate()?;
        self.lookup.validate()?;
        self.poll.validate()?;
        Ok(())
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the recognized local interfaces
///
/// The platform assigns these names ("en0"/"en1" on macOS, "eth0"/"wlan0"
/// on most Linux systems), so they are configuration rather than
/// compiled-in constants. Any other interface name reported by the
/// enumerator is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceNames {
    /// Name of the primary wired interface
    pub wired: String,

    /// Name of the primary wireless interface
    pub wireless: String,
}

impl InterfaceNames {
    /// Create interface names from explicit values
    pub fn new(wired: impl Into<String>, wireless: impl Into<String>) -> Self {
        Self {
            wired: wired.into(),
            wireless: wireless.into(),
        }
    }

    /// Validate the interface names
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.wired.is_empty() {
            return Err(crate::Error::config("wired interface name cannot be empty"));
        }
        if self.wireless.is_empty() {
            return Err(crate::Error::config(
                "wireless interface name cannot be empty",
            ));
        }
        if self.wired == self.wireless {
            return Err(crate::Error::config(
                "wired and wireless interface names must differ",
            ));
        }
        Ok(())
    }
}

impl Default for InterfaceNames {
    fn default() -> Self {
        Self {
            wired: default_wired_name(),
            wireless: default_wireless_name(),
        }
    }
}

/// External address lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// IP-echo endpoint for IPv4 lookups
    #[serde(default = "default_v4_url")]
    pub v4_url: String,

    /// IP-echo endpoint for IPv6 lookups
    #[serde(default = "default_v6_url")]
    pub v6_url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for url in [&self.v4_url, &self.v6_url] {
            if url.is_empty() {
                return Err(crate::Error::config("lookup URL cannot be empty"));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "lookup URL must use http or https scheme: {}",
                    url
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("lookup timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            v4_url: default_v4_url(),
            v6_url: default_v6_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Fixed delay between fetch cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the broadcast event channel
    ///
    /// A slow subscriber that lags more than this many events behind
    /// misses the overwritten ones; state writes are never blocked on
    /// event delivery.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollConfig {
    /// Validate the poll configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "event channel capacity must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_wired_name() -> String {
    if cfg!(target_os = "macos") {
        "en0".to_string()
    } else {
        "eth0".to_string()
    }
}

fn default_wireless_name() -> String {
    if cfg!(target_os = "macos") {
        "en1".to_string()
    } else {
        "wlan0".to_string()
    }
}

fn default_v4_url() -> String {
    "https://api.ipify.org?format=json".to_string()
}

fn default_v6_url() -> String {
    "https://api64.ipify.org?format=json".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    64
}
