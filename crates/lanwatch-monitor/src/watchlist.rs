//! Watched devices and their dead/reborn alert gate.

use std::collections::HashMap;

use lanwatch_core::types::{MacAddr, WatchState};

use crate::config::WatchlistEntryConfig;
use crate::error::Result;

/// A watched device: display alias plus the last alert raised for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub alias: String,
    pub state: WatchState,
}

/// Configured devices keyed by MAC, case-insensitively.
///
/// Besides the configured entries, the watchlist keeps an alert gate for
/// unwatched devices so forced reborn alerts are not repeated.
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    entries: HashMap<MacAddr, WatchEntry>,
    unwatched: HashMap<MacAddr, WatchState>,
}

impl Watchlist {
    /// Build from configuration. Every entry starts in the `dead` state.
    pub fn from_config(entries: &[WatchlistEntryConfig]) -> Result<Self> {
        let mut watchlist = Self::default();
        for entry in entries {
            let mac: MacAddr = entry.mac.parse()?;
            watchlist.insert(mac, &entry.alias);
        }
        Ok(watchlist)
    }

    pub fn insert(&mut self, mac: MacAddr, alias: &str) {
        self.entries.insert(
            mac,
            WatchEntry {
                alias: alias.to_string(),
                state: WatchState::Dead,
            },
        );
    }

    pub fn get(&self, mac: &MacAddr) -> Option<&WatchEntry> {
        self.entries.get(mac)
    }

    pub fn contains(&self, mac: &MacAddr) -> bool {
        self.entries.contains_key(mac)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current alert state, watched or not. Unknown devices read as `dead`.
    pub fn state(&self, mac: &MacAddr) -> WatchState {
        match self.entries.get(mac) {
            Some(entry) => entry.state,
            None => self.unwatched.get(mac).copied().unwrap_or_default(),
        }
    }

    /// Record that an alert of kind `state` was raised for `mac`.
    pub fn set_state(&mut self, mac: &MacAddr, state: WatchState) {
        match self.entries.get_mut(mac) {
            Some(entry) => entry.state = state,
            None => {
                self.unwatched.insert(mac.clone(), state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_starts_dead() {
        let watchlist = Watchlist::from_config(&[WatchlistEntryConfig {
            mac: "aa-bb-cc-dd-ee-01".to_string(),
            alias: "printer".to_string(),
        }])
        .unwrap();

        let mac = MacAddr::new("AA:BB:CC:DD:EE:01");
        assert!(watchlist.contains(&mac));
        assert_eq!(watchlist.get(&mac).unwrap().alias, "printer");
        assert_eq!(watchlist.state(&mac), WatchState::Dead);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let mut watchlist = Watchlist::default();
        watchlist.insert(MacAddr::new("AA:BB:CC:DD:EE:01"), "nas");
        assert!(watchlist.contains(&MacAddr::new("aa:bb:cc:dd:ee:01")));
    }

    #[test]
    fn test_set_state_persists() {
        let mut watchlist = Watchlist::default();
        let mac = MacAddr::new("AA:BB:CC:DD:EE:01");
        watchlist.insert(mac.clone(), "nas");

        watchlist.set_state(&mac, WatchState::Reborn);
        assert_eq!(watchlist.state(&mac), WatchState::Reborn);
        assert_eq!(watchlist.get(&mac).unwrap().state, WatchState::Reborn);
    }

    #[test]
    fn test_unwatched_gate() {
        let mut watchlist = Watchlist::default();
        let mac = MacAddr::new("AA:BB:CC:DD:EE:09");
        assert_eq!(watchlist.state(&mac), WatchState::Dead);

        watchlist.set_state(&mac, WatchState::Reborn);
        assert_eq!(watchlist.state(&mac), WatchState::Reborn);
        assert!(!watchlist.contains(&mac));
        assert!(watchlist.is_empty());
    }

    #[test]
    fn test_bad_mac_rejected() {
        let result = Watchlist::from_config(&[WatchlistEntryConfig {
            mac: "printer".to_string(),
            alias: "printer".to_string(),
        }]);
        assert!(result.is_err());
    }
}
