//! Transition engine: applies presence state-machine rules to the device
//! records and decides which transitions raise a notification.
//!
//! The engine is synchronous and owns no clock or scheduler; callers hand
//! it the scan time so multiple cycles can be replayed deterministically.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use lanwatch_core::events::Notification;
use lanwatch_core::types::{DeviceRecord, DeviceStatus, DiscoveredHost, MacAddr, WatchState};

use crate::classify::{self, Classification, ClassifySummary};
use crate::config::{MonitorConfig, TimestampPolicy};
use crate::error::Result;
use crate::store::DeviceStore;
use crate::watchlist::Watchlist;

/// Engine knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct StationSettings {
    pub station_name: String,
    pub dead_timeout_secs: i64,
    pub force_alert_reborn: bool,
    pub timestamp_policy: TimestampPolicy,
    pub notify_pause: Duration,
}

impl From<&MonitorConfig> for StationSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            station_name: config.station_name.clone(),
            dead_timeout_secs: config.dead_timeout_secs,
            force_alert_reborn: config.force_alert_reborn,
            timestamp_policy: config.timestamp_policy,
            notify_pause: Duration::from_millis(config.notify_pause_ms),
        }
    }
}

/// What one pass of the engine changed and wants announced.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub summary: ClassifySummary,
    pub notifications: Vec<Notification>,
    /// Whether any record changed and the store needs saving.
    pub dirty: bool,
}

/// The long-lived monitoring context: settings, device records, watchlist,
/// and the store they are persisted to.
pub struct Station<S> {
    settings: StationSettings,
    devices: Vec<DeviceRecord>,
    watchlist: Watchlist,
    store: S,
    /// Set by any change not yet written; cleared only by a successful save.
    needs_save: bool,
}

impl<S: DeviceStore> Station<S> {
    /// Load the device records from `store` and build the station.
    ///
    /// Records sharing a MAC are folded into the first one; the station is
    /// then marked unsaved so the next cycle writes the deduplicated set.
    pub fn open(settings: StationSettings, watchlist: Watchlist, store: S) -> Result<Self> {
        let loaded = store.load()?;
        let loaded_count = loaded.len();
        let devices = dedup_by_mac(loaded);
        let needs_save = devices.len() != loaded_count;

        tracing::info!(
            devices = devices.len(),
            watched = watchlist.len(),
            "Station opened"
        );

        Ok(Self {
            settings,
            devices,
            watchlist,
            store,
            needs_save,
        })
    }

    pub fn settings(&self) -> &StationSettings {
        &self.settings
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether in-memory records differ from what was last saved.
    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    /// Write the current records to the store.
    pub fn persist(&mut self) -> Result<()> {
        self.store.save(&self.devices)?;
        self.needs_save = false;
        Ok(())
    }

    /// Classify `hosts` seen at `now` and apply the transitions.
    ///
    /// Passes run present, absent, dead, new: records appended by the new
    /// pass are not revisited by the earlier ones.
    pub fn apply_scan(&mut self, hosts: Vec<DiscoveredHost>, now: i64) -> CycleOutcome {
        let classification =
            classify::classify(hosts, &self.devices, now, self.settings.dead_timeout_secs);
        let summary = classification.summary();

        tracing::debug!(
            present = summary.present_count,
            new = summary.new_count,
            absent = summary.absent_count,
            dead = summary.dead_count,
            "Classified scan"
        );

        let Classification {
            present,
            new,
            absent,
            dead,
        } = classification;

        let mut pass = Pass {
            settings: &self.settings,
            index: index_by_mac(&self.devices),
            devices: &mut self.devices,
            watchlist: &mut self.watchlist,
            notifications: Vec::new(),
            dirty: false,
        };

        pass.present(&present);
        pass.absent(&absent);
        pass.dead(&dead);
        pass.new_devices(new);

        let dirty = pass.dirty;
        let notifications = pass.notifications;
        self.needs_save |= dirty;

        CycleOutcome {
            summary,
            notifications,
            dirty,
        }
    }
}

/// Keep the first record per MAC, dropping later duplicates.
fn dedup_by_mac(records: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
    let mut seen: HashSet<MacAddr> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        if !record.mac_address.is_empty() && !seen.insert(record.mac_address.clone()) {
            tracing::warn!(
                mac = %record.mac_address,
                status = %record.status,
                "Duplicate device record in store, dropping"
            );
            continue;
        }
        kept.push(record);
    }

    kept
}

fn index_by_mac(devices: &[DeviceRecord]) -> HashMap<MacAddr, usize> {
    devices
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.mac_address.is_empty())
        .map(|(i, r)| (r.mac_address.clone(), i))
        .collect()
}

/// Mutable state for a single run of the transition passes.
struct Pass<'a> {
    settings: &'a StationSettings,
    index: HashMap<MacAddr, usize>,
    devices: &'a mut Vec<DeviceRecord>,
    watchlist: &'a mut Watchlist,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl Pass<'_> {
    fn record_mut(&mut self, mac: &MacAddr) -> Option<&mut DeviceRecord> {
        match self.index.get(mac) {
            Some(&i) => self.devices.get_mut(i),
            None => {
                tracing::error!(mac = %mac, "Classified device missing from store, skipping");
                None
            }
        }
    }

    fn set_status(&mut self, mac: &MacAddr, status: DeviceStatus) -> Option<DeviceStatus> {
        let record = self.record_mut(mac)?;
        let previous = record.status;
        if previous != status {
            record.status = status;
            self.dirty = true;
        }
        Some(previous)
    }

    fn present(&mut self, hosts: &[DiscoveredHost]) {
        let refresh = self.settings.timestamp_policy == TimestampPolicy::LastSeen;

        for host in hosts {
            let Some(record) = self.record_mut(&host.mac_address) else {
                continue;
            };

            let mut changed = false;
            if !host.ip_address.is_empty() && record.ip_address != host.ip_address {
                record.ip_address.clone_from(&host.ip_address);
                changed = true;
            }
            if refresh && record.timestamp != host.timestamp {
                record.timestamp = host.timestamp;
                changed = true;
            }
            let previous = record.status;
            let description = record.description.clone();
            self.dirty |= changed;

            match previous {
                DeviceStatus::Present => {}
                DeviceStatus::Dead => self.reborn(&host.mac_address, description),
                DeviceStatus::Absent => self.comeback(&host.mac_address),
            }
        }
    }

    /// A dead device reappeared. It re-enters as absent, not present.
    fn reborn(&mut self, mac: &MacAddr, description: String) {
        self.set_status(mac, DeviceStatus::Absent);
        tracing::info!(mac = %mac, "Device reborn");

        let alias = match self.watchlist.get(mac) {
            Some(entry) => entry.alias.clone(),
            None if self.settings.force_alert_reborn => description,
            None => return,
        };

        if self.watchlist.state(mac) == WatchState::Dead {
            self.watchlist.set_state(mac, WatchState::Reborn);
            self.notifications.push(Notification::Reborn {
                mac: mac.clone(),
                alias,
            });
        }
    }

    /// An absent device reappeared.
    fn comeback(&mut self, mac: &MacAddr) {
        self.set_status(mac, DeviceStatus::Present);
        tracing::debug!(mac = %mac, "Device back from absence");
    }

    fn absent(&mut self, macs: &[MacAddr]) {
        for mac in macs {
            if self.set_status(mac, DeviceStatus::Absent) == Some(DeviceStatus::Present) {
                tracing::debug!(mac = %mac, "Device absent");
            }
        }
    }

    fn dead(&mut self, macs: &[MacAddr]) {
        for mac in macs {
            match self.set_status(mac, DeviceStatus::Dead) {
                None => continue,
                Some(DeviceStatus::Dead) => {}
                Some(_) => tracing::info!(mac = %mac, "Device dead"),
            }

            if self.watchlist.state(mac) != WatchState::Reborn {
                continue;
            }
            self.watchlist.set_state(mac, WatchState::Dead);

            if let Some(entry) = self.watchlist.get(mac) {
                self.notifications.push(Notification::Dead {
                    mac: mac.clone(),
                    alias: entry.alias.clone(),
                });
            }
        }
    }

    fn new_devices(&mut self, hosts: Vec<DiscoveredHost>) {
        for host in hosts {
            let record = DeviceRecord::first_sighting(&host);
            self.index.insert(record.mac_address.clone(), self.devices.len());
            self.devices.push(record);
            self.dirty = true;

            tracing::info!(
                mac = %host.mac_address,
                ip = %host.ip_address,
                description = %host.description,
                "New device"
            );

            let event = match self.watchlist.get(&host.mac_address) {
                Some(entry) => {
                    let alias = entry.alias.clone();
                    self.watchlist
                        .set_state(&host.mac_address, WatchState::Reborn);
                    Notification::Connected {
                        mac: host.mac_address,
                        alias,
                    }
                }
                None => Notification::FirstSeen {
                    mac: host.mac_address,
                    description: host.description,
                },
            };
            self.notifications.push(event);
        }
    }
}
