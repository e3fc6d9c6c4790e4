// # hostwatchd - Network-State Observer Daemon
//
// The hostwatchd daemon is a thin integration layer:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and tracing
// 3. Wiring the enumerator, lookup, and probe into a HostWatcher
// 4. Logging change events until a shutdown signal arrives
//
// All observation logic lives in hostwatch-core; no coordination or
// classification logic belongs here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `HOSTWATCH_WIRED_IF`: primary wired interface name (default eth0,
//   en0 on macOS)
// - `HOSTWATCH_WIRELESS_IF`: primary wireless interface name (default
//   wlan0, en1 on macOS)
// - `HOSTWATCH_LOOKUP_V4_URL`: v4 IP-echo endpoint
// - `HOSTWATCH_LOOKUP_V6_URL`: v6 IP-echo endpoint
// - `HOSTWATCH_POLL_INTERVAL_SECS`: delay between fetch cycles
// - `HOSTWATCH_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export HOSTWATCH_WIRED_IF=enp3s0
// export HOSTWATCH_WIRELESS_IF=wlp2s0
// export HOSTWATCH_POLL_INTERVAL_SECS=5
//
// hostwatchd
// ```

use anyhow::Result;
use hostwatch_core::{HostEvent, HostWatcher, WatchConfig};
use hostwatch_ip_http::HttpIpLookup;
use hostwatch_link_netdev::NetdevEnumerator;
use hostwatch_path_probe::UdpProbeFeed;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    wired_if: Option<String>,
    wireless_if: Option<String>,
    lookup_v4_url: Option<String>,
    lookup_v6_url: Option<String>,
    poll_interval_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            wired_if: env::var("HOSTWATCH_WIRED_IF").ok(),
            wireless_if: env::var("HOSTWATCH_WIRELESS_IF").ok(),
            lookup_v4_url: env::var("HOSTWATCH_LOOKUP_V4_URL").ok(),
            lookup_v6_url: env::var("HOSTWATCH_LOOKUP_V6_URL").ok(),
            poll_interval_secs: env::var("HOSTWATCH_POLL_INTERVAL_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("HOSTWATCH_POLL_INTERVAL_SECS: {}", e))?,
            log_level: env::var("HOSTWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.wired_if
            && name.is_empty()
        {
            anyhow::bail!("HOSTWATCH_WIRED_IF cannot be empty");
        }

        if let Some(ref name) = self.wireless_if
            && name.is_empty()
        {
            anyhow::bail!("HOSTWATCH_WIRELESS_IF cannot be empty");
        }

        if let (Some(wired), Some(wireless)) = (&self.wired_if, &self.wireless_if)
            && wired == wireless
        {
            anyhow::bail!(
                "HOSTWATCH_WIRED_IF and HOSTWATCH_WIRELESS_IF must name different interfaces"
            );
        }

        for (var, url) in [
            ("HOSTWATCH_LOOKUP_V4_URL", &self.lookup_v4_url),
            ("HOSTWATCH_LOOKUP_V6_URL", &self.lookup_v6_url),
        ] {
            if let Some(url) = url {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", var, url);
                }
                if url.starts_with("http://") {
                    eprintln!(
                        "WARNING: {} uses HTTP (not HTTPS). \
                         This is less secure. Consider using HTTPS.",
                        var
                    );
                }
            }
        }

        if let Some(interval) = self.poll_interval_secs
            && !(1..=3600).contains(&interval)
        {
            anyhow::bail!(
                "HOSTWATCH_POLL_INTERVAL_SECS must be between 1 and 3600. Got: {}",
                interval
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "HOSTWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the watcher configuration, env values over defaults
    fn watch_config(&self) -> WatchConfig {
        let mut config = WatchConfig::default();

        if let Some(ref wired) = self.wired_if {
            config.interfaces.wired = wired.clone();
        }
        if let Some(ref wireless) = self.wireless_if {
            config.interfaces.wireless = wireless.clone();
        }
        if let Some(ref url) = self.lookup_v4_url {
            config.lookup.v4_url = url.clone();
        }
        if let Some(ref url) = self.lookup_v6_url {
            config.lookup.v6_url = url.clone();
        }
        if let Some(interval) = self.poll_interval_secs {
            config.poll.interval_secs = interval;
        }

        config
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting hostwatchd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let watch_config = config.watch_config();
    let poll_interval = Duration::from_secs(watch_config.poll.interval_secs);

    info!(
        wired = %watch_config.interfaces.wired,
        wireless = %watch_config.interfaces.wireless,
        "Watching interfaces"
    );

    let lookup = HttpIpLookup::new(&watch_config.lookup);
    let watcher = HostWatcher::new(
        Arc::new(NetdevEnumerator::new()),
        Arc::new(lookup),
        Arc::new(UdpProbeFeed::new()),
        watch_config,
    )?;

    // Subscribe before start so the initial transitions are observed
    let events = watcher.subscribe();
    let mut shutdown_events = watcher.subscribe();
    tokio::spawn(log_events(events));

    watcher.start();

    let signal_name = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal_name);

    watcher.stop();

    // The stop is cooperative: the in-flight fetch pair finishes first.
    // Give it one full cycle plus slack before giving up.
    let grace = poll_interval + Duration::from_secs(5);
    let stopped = tokio::time::timeout(grace, async {
        while let Ok(event) = shutdown_events.recv().await {
            if matches!(event, HostEvent::Stopped { .. }) {
                break;
            }
        }
    })
    .await;

    match stopped {
        Ok(()) => info!("Shutdown complete"),
        Err(_) => warn!("Shutdown grace period elapsed, exiting anyway"),
    }

    Ok(())
}

/// Log every change event until the watcher drops the channel
async fn log_events(mut events: tokio::sync::broadcast::Receiver<HostEvent>) {
    loop {
        match events.recv().await {
            Ok(HostEvent::Reachability { reachable }) => {
                info!(reachable, "reachability changed");
            }
            Ok(HostEvent::WiredLink { link }) => {
                info!(mac = %link.mac, ipv4 = ?link.ipv4, ipv6 = ?link.ipv6, "wired link changed");
            }
            Ok(HostEvent::WirelessLink { link }) => {
                info!(mac = %link.mac, ipv4 = ?link.ipv4, ipv6 = ?link.ipv6, "wireless link changed");
            }
            Ok(HostEvent::ExternalAddress { family, address }) => {
                info!(%family, %address, "external address changed");
            }
            Ok(HostEvent::Started) => {
                info!("watcher started");
            }
            Ok(HostEvent::Stopped { reason }) => {
                info!(%reason, "watcher stopped");
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "event subscriber lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
