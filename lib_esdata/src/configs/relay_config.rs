use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Version string reported in the self snapshot.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// # Relay Config
///
/// Every constant the engine runs on. Missing keys in a JSON document fall back
/// to the defaults, so a config file only needs to name what it changes.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RelayConfig {
    /// Collector host name, without scheme.
    pub collector_host: String,
    /// Path the diff document is POSTed to.
    pub collector_path: String,
    /// `https` when true, plain `http` otherwise (local collectors).
    pub use_tls: bool,
    /// Upper bound for a single send, connect included.
    pub request_timeout_secs: u64,
    /// Entity count above which the whole buffer is discarded.
    pub max_entities: usize,
    /// Airport count above which the runway configuration is reset.
    pub max_airports: usize,
    /// Quiet period after going live before anything is recorded or sent.
    pub settle_delay_secs: u64,
    /// The self snapshot is taken on every tick divisible by this.
    pub self_refresh_ticks: u64,
    /// Fixed part of the debounce window.
    pub debounce_base_secs: u64,
    /// Upper bound (inclusive) of the random part of the debounce window.
    pub debounce_jitter_secs: u64,
    /// How long a dispatch waits for an in-flight send before skipping.
    pub lock_timeout_ms: u64,
    /// Dispatch whatever is pending when the connection drops.
    pub flush_on_disconnect: bool,
    /// Start with update-all mode on.
    pub update_all: bool,
    /// Start with debug messages on.
    pub debug: bool,
    /// Version string reported in the self snapshot.
    pub plugin_version: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            collector_host: "vatiris.se".to_string(),
            collector_path: "/api/esdata".to_string(),
            use_tls: true,
            request_timeout_secs: 10,
            max_entities: 1000,
            max_airports: 100,
            settle_delay_secs: 10,
            self_refresh_ticks: 30,
            debounce_base_secs: 5,
            debounce_jitter_secs: 9,
            lock_timeout_ms: 1000,
            flush_on_disconnect: false,
            update_all: false,
            debug: false,
            plugin_version: PLUGIN_VERSION.to_string(),
        }
    }
}

impl RelayConfig {
    /// Full collector URL built from host, path and scheme.
    pub fn collector_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        let path = if self.collector_path.starts_with('/') {
            self.collector_path.clone()
        } else {
            format!("/{}", self.collector_path)
        };
        format!("{}://{}{}", scheme, self.collector_host, path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl fmt::Display for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RelayConfig
    Collector: {},
    Max entities: {},
    Settle delay: {}s,
    Debounce: {}s + 0..={}s,
    Self refresh: every {} ticks,
    Update all: {},
    Debug: {}
",
            self.collector_url(),
            self.max_entities,
            self.settle_delay_secs,
            self.debounce_base_secs,
            self.debounce_jitter_secs,
            self.self_refresh_ticks,
            self.update_all,
            self.debug
        )
    }
}
