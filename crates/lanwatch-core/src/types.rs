//! Core domain types for device presence tracking.
//!
//! Device records are what the store persists between cycles; discovered
//! hosts are what a single scan produces. Both are keyed by MAC address.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

// ── MAC Address ───────────────────────────────────────────────────

/// A hardware address as reported by the scanner or configured by the user.
///
/// Equality and hashing ignore ASCII case, so `aa:bb:..` and `AA:BB:..`
/// identify the same device. The original spelling is kept for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddr(String);

impl MacAddr {
    /// Wrap a scanner-reported address without validating its shape.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for MacAddr {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for MacAddr {}

impl Hash for MacAddr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_uppercase());
        }
        state.write_usize(self.0.len());
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strict parse for configured addresses: six hex octets separated by `:` or `-`.
/// The result is normalized to upper case with `:` separators.
impl FromStr for MacAddr {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let octets: Vec<&str> = trimmed.split([':', '-']).collect();
        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        if !well_formed {
            return Err(CoreError::InvalidMac(s.to_string()));
        }

        Ok(Self(octets.join(":").to_ascii_uppercase()))
    }
}

// ── Device Status ─────────────────────────────────────────────────

/// Tri-state presence status, persisted as `1`, `0` or `-1`.
///
/// Any positive integer read back from disk folds to `Present` and any
/// negative one to `Dead`, so only canonical values are ever written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "i64", into = "i64")]
pub enum DeviceStatus {
    Present,
    Absent,
    Dead,
}

impl DeviceStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Present => 1,
            Self::Absent => 0,
            Self::Dead => -1,
        }
    }
}

impl From<i64> for DeviceStatus {
    fn from(raw: i64) -> Self {
        match raw {
            r if r >= 1 => Self::Present,
            0 => Self::Absent,
            _ => Self::Dead,
        }
    }
}

impl From<DeviceStatus> for i64 {
    fn from(status: DeviceStatus) -> Self {
        status.as_i64()
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
            Self::Dead => f.write_str("dead"),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────

/// A known device, persisted in the device store. Never deleted: a dead
/// device stays behind as a tombstone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRecord {
    pub mac_address: MacAddr,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub description: String,
    /// Epoch seconds of the first (or, under the last-seen policy, latest) sighting.
    #[serde(deserialize_with = "deserialize_epoch")]
    pub timestamp: i64,
    pub status: DeviceStatus,
}

impl DeviceRecord {
    /// Build the record for a host seen for the first time.
    pub fn first_sighting(host: &DiscoveredHost) -> Self {
        Self {
            mac_address: host.mac_address.clone(),
            ip_address: host.ip_address.clone(),
            description: host.description.clone(),
            timestamp: host.timestamp,
            status: DeviceStatus::Present,
        }
    }

    /// Seconds elapsed between the recorded timestamp and `now`,
    /// clamped to the `i64` range.
    pub fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }
}

/// A host reported by the scanner during the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub ip_address: String,
    pub mac_address: MacAddr,
    /// Scan time, epoch seconds.
    pub timestamp: i64,
    pub description: String,
}

// ── Watchlist ─────────────────────────────────────────────────────

/// Which alert was last raised for a watched device.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    #[default]
    Dead,
    Reborn,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dead => f.write_str("dead"),
            Self::Reborn => f.write_str("reborn"),
        }
    }
}

/// Older stores wrote epoch seconds as decimal strings; accept both.
fn deserialize_epoch<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Int(i64),
        Text(String),
    }

    match Epoch::deserialize(deserializer)? {
        Epoch::Int(v) => Ok(v),
        Epoch::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
