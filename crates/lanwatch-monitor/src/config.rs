//! Configuration for the lanwatch monitor.

use ipnet::IpNet;
use serde::Deserialize;

use lanwatch_core::types::MacAddr;

use crate::error::{MonitorError, Result};

/// Top-level monitor configuration.
///
/// Loaded once at startup from the `--config` file (TOML, JSON or YAML) and
/// `LANWATCH__` environment variables. The legacy keys `interval`,
/// `dead_timeout` and `database` from older `config.json` files are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Network segment to sweep, in CIDR notation.
    pub network: String,

    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Seconds between cycles.
    #[serde(default = "default_interval", alias = "interval")]
    pub interval_secs: u64,

    /// Seconds after which an unseen device is considered dead.
    #[serde(default = "default_dead_timeout", alias = "dead_timeout")]
    pub dead_timeout_secs: i64,

    /// Path to the JSON device database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Station name used in notification text.
    #[serde(default = "default_station_name")]
    pub station_name: String,

    /// Raise reborn alerts for every device, not only watched ones.
    #[serde(default)]
    pub force_alert_reborn: bool,

    /// Use a canned scan instead of running nmap.
    #[serde(default)]
    pub dummy_scan: bool,

    /// Send notifications through LINE Notify.
    #[serde(default)]
    pub line_enable: bool,

    /// LINE Notify access token.
    #[serde(default)]
    pub line_token: String,

    /// Pause between successive new-device notifications, in milliseconds.
    #[serde(default = "default_notify_pause_ms")]
    pub notify_pause_ms: u64,

    /// Whether sightings refresh a device's timestamp.
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,

    /// Devices with human aliases that get presence alerts.
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntryConfig>,
}

/// A configured watchlist entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistEntryConfig {
    pub mac: String,
    pub alias: String,
}

/// What a device's timestamp measures, and so where the dead timeout counts from.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Set once on first sighting and never refreshed.
    #[default]
    FirstSeen,
    /// Refreshed on every cycle the device is seen.
    LastSeen,
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_interval() -> u64 {
    60
}

fn default_dead_timeout() -> i64 {
    3600
}

fn default_database() -> String {
    "devices.json".to_string()
}

fn default_station_name() -> String {
    "lanwatch".to_string()
}

fn default_notify_pause_ms() -> u64 {
    100
}

impl MonitorConfig {
    /// Load configuration from `file_prefix` (extension optional) layered under
    /// `LANWATCH__*` environment variables. A missing file is an error.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(true))
            .add_source(
                config::Environment::with_prefix("LANWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        let parsed: Self = cfg
            .try_deserialize()
            .map_err(|e| MonitorError::Config(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.network.parse::<IpNet>().map_err(|e| {
            MonitorError::Config(format!("network {:?} is not a CIDR: {e}", self.network))
        })?;

        if self.interval_secs == 0 {
            return Err(MonitorError::Config("interval_secs must be positive".into()));
        }
        if self.dead_timeout_secs <= 0 {
            return Err(MonitorError::Config(
                "dead_timeout_secs must be positive".into(),
            ));
        }
        if self.line_enable && self.line_token.is_empty() {
            return Err(MonitorError::Config(
                "line_enable is set but line_token is empty".into(),
            ));
        }

        for entry in &self.watchlist {
            entry.mac.parse::<MacAddr>()?;
        }

        Ok(())
    }
}
