use clap::Parser;
use lib_esdata::RelayConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "server_esdata.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Relays EuroScope flight data diffs to the esdata collector", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "ESDATA_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "ESDATA_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "ESDATA_LOG_LEVEL", help = "Logging level (debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(
        long,
        env = "ESDATA_INPUT",
        help = "Host event feed (NDJSON). Reads stdin when not set."
    )]
    pub input: Option<PathBuf>,

    #[clap(long, env = "ESDATA_TICK_MS", help = "Timer tick interval in milliseconds.")]
    pub tick_ms: Option<u64>,

    #[clap(
        long,
        env = "ESDATA_COLLECTOR_HOST",
        help = "Collector host name, optionally with port."
    )]
    pub collector_host: Option<String>,

    #[clap(long, env = "ESDATA_COLLECTOR_PATH", help = "Collector endpoint path.")]
    pub collector_path: Option<String>,

    #[clap(long, env = "ESDATA_USE_TLS", help = "Post over https (true) or plain http (false).")]
    pub use_tls: Option<bool>,

    #[clap(
        long,
        env = "ESDATA_REQUEST_TIMEOUT_SECS",
        help = "Timeout in seconds for a single post."
    )]
    pub request_timeout_secs: Option<u64>,

    #[clap(
        long,
        env = "ESDATA_MAX_ENTITIES",
        help = "Pending entity count above which the buffer is discarded."
    )]
    pub max_entities: Option<usize>,

    #[clap(
        long,
        env = "ESDATA_SETTLE_DELAY_SECS",
        help = "Seconds after going live before anything is recorded."
    )]
    pub settle_delay_secs: Option<u64>,

    #[clap(
        long,
        env = "ESDATA_FLUSH_ON_DISCONNECT",
        help = "Post pending diffs when the connection drops."
    )]
    pub flush_on_disconnect: Option<bool>,

    #[clap(
        long,
        env = "ESDATA_UPDATE_ALL",
        help = "Record flight plans not tracked by the operator."
    )]
    pub update_all: Option<bool>,

    #[clap(long, env = "ESDATA_DEBUG", help = "Log relay diagnostics at info level.")]
    pub debug: Option<bool>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            input: other.input.or(self.input),
            tick_ms: other.tick_ms.or(self.tick_ms),
            collector_host: other.collector_host.or(self.collector_host),
            collector_path: other.collector_path.or(self.collector_path),
            use_tls: other.use_tls.or(self.use_tls),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            max_entities: other.max_entities.or(self.max_entities),
            settle_delay_secs: other.settle_delay_secs.or(self.settle_delay_secs),
            flush_on_disconnect: other.flush_on_disconnect.or(self.flush_on_disconnect),
            update_all: other.update_all.or(self.update_all),
            debug: other.debug.or(self.debug),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms.unwrap_or(1000).max(1)
    }

    /// Engine tunables: library defaults overridden by whatever is set here.
    pub fn relay_config(&self) -> RelayConfig {
        let mut relay = RelayConfig::default();
        if let Some(host) = &self.collector_host {
            relay.collector_host = host.clone();
        }
        if let Some(path) = &self.collector_path {
            relay.collector_path = path.clone();
        }
        if let Some(tls) = self.use_tls {
            relay.use_tls = tls;
        }
        if let Some(secs) = self.request_timeout_secs {
            relay.request_timeout_secs = secs;
        }
        if let Some(max) = self.max_entities {
            relay.max_entities = max;
        }
        if let Some(secs) = self.settle_delay_secs {
            relay.settle_delay_secs = secs;
        }
        if let Some(flush) = self.flush_on_disconnect {
            relay.flush_on_disconnect = flush;
        }
        if let Some(all) = self.update_all {
            relay.update_all = all;
        }
        if let Some(debug) = self.debug {
            relay.debug = debug;
        }
        relay
    }
}

/// `<data dir>/esdata/logs`, or `./logs` when there is no data dir.
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("esdata").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            path.display()
        );
        return None;
    }
    let Ok(config_str) = fs::read_to_string(path) else {
        log::warn!(
            "Failed to read config file: {}. Falling back to other sources.",
            path.display()
        );
        return None;
    };
    match serde_json::from_str::<Config>(&config_str) {
        Ok(file_config) => Some(file_config),
        Err(e) => {
            log::warn!(
                "Failed to parse config file {}: {}. Falling back to other sources.",
                path.display(),
                e
            );
            None
        }
    }
}

/// Defaults, then the config file, then environment and CLI.
pub fn load_config() -> Config {
    resolve(Config::parse())
}

pub fn resolve(cli: Config) -> Config {
    // 1. Load defaults
    let default_config = Config {
        log_level: Some("info".to_string()),
        tick_ms: Some(1000),
        ..Default::default()
    };

    // 2. Load from config file (server_esdata.conf) if present.
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = default_config;
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }

    // 3. Environment variables and CLI arguments win.
    current_config.merge(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_overrides_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"collectorHost":"127.0.0.1:8080","useTls":false,"logLevel":"debug","settleDelaySecs":3}}"#
        )
        .unwrap();

        let cli = Config {
            config_path: Some(file.path().to_path_buf()),
            settle_delay_secs: Some(0),
            ..Default::default()
        };
        let config = resolve(cli);

        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.tick_ms(), 1000);
        let relay = config.relay_config();
        assert_eq!(relay.collector_url(), "http://127.0.0.1:8080/api/esdata");
        assert_eq!(relay.settle_delay_secs, 0);
        assert_eq!(relay.max_entities, 1000);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = resolve(Config {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        });
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.relay_config(), RelayConfig::default());
    }

    #[test]
    fn missing_file_is_fine() {
        let config = resolve(Config {
            config_path: Some(PathBuf::from("/nonexistent/server_esdata.conf")),
            debug: Some(true),
            ..Default::default()
        });
        assert!(config.relay_config().debug);
        assert!(config.input.is_none());
    }
}
