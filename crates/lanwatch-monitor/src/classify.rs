//! Presence classification: split one scan's hosts and the stored devices
//! into the present, new, absent, and dead working sets.

use std::collections::HashSet;

use lanwatch_core::types::{DeviceRecord, DiscoveredHost, MacAddr};

/// The four disjoint working sets of a cycle.
#[derive(Debug, Default)]
pub struct Classification {
    /// Discovered hosts already in the store.
    pub present: Vec<DiscoveredHost>,
    /// Discovered hosts not yet in the store.
    pub new: Vec<DiscoveredHost>,
    /// Stored devices not discovered, still within the dead timeout.
    pub absent: Vec<MacAddr>,
    /// Stored devices not discovered, at or past the dead timeout.
    pub dead: Vec<MacAddr>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassifySummary {
    pub present_count: usize,
    pub new_count: usize,
    pub absent_count: usize,
    pub dead_count: usize,
}

impl Classification {
    pub fn summary(&self) -> ClassifySummary {
        ClassifySummary {
            present_count: self.present.len(),
            new_count: self.new.len(),
            absent_count: self.absent.len(),
            dead_count: self.dead.len(),
        }
    }
}

/// Classify `discovered` against the pre-cycle `stored` snapshot.
///
/// Matching is by MAC only. Hosts or records with an empty MAC are ignored,
/// and a MAC reported twice in one scan keeps its first report.
pub fn classify(
    discovered: Vec<DiscoveredHost>,
    stored: &[DeviceRecord],
    now: i64,
    dead_timeout_secs: i64,
) -> Classification {
    let known: HashSet<&MacAddr> = stored
        .iter()
        .filter(|r| !r.mac_address.is_empty())
        .map(|r| &r.mac_address)
        .collect();

    let mut out = Classification::default();
    let mut seen: HashSet<MacAddr> = HashSet::new();

    for host in discovered {
        if host.mac_address.is_empty() {
            continue;
        }
        if !seen.insert(host.mac_address.clone()) {
            tracing::debug!(mac = %host.mac_address, ip = %host.ip_address, "Duplicate MAC in scan, ignoring");
            continue;
        }

        if known.contains(&host.mac_address) {
            out.present.push(host);
        } else {
            out.new.push(host);
        }
    }

    for record in stored {
        if record.mac_address.is_empty() || seen.contains(&record.mac_address) {
            continue;
        }

        if record.age_secs(now) < dead_timeout_secs {
            out.absent.push(record.mac_address.clone());
        } else {
            out.dead.push(record.mac_address.clone());
        }
    }

    out
}
