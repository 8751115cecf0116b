//! Nmap ping-sweep text output parsing.
//!
//! `nmap -sn` prints one block per responding host followed by a summary:
//!
//! ```text
//! Nmap scan report for 192.168.1.99
//! Host is up (0.29s latency).
//! MAC Address: 44:55:55:44:44:22 (Vendor Name)
//! Nmap done: 256 IP addresses (2 hosts up) scanned in 10.57 seconds
//! ```
//!
//! Only blocks carrying a `MAC Address:` line produce a host; the scanning
//! machine itself and hosts behind a router report no MAC and are skipped.

use lanwatch_core::types::{DiscoveredHost, MacAddr};

use crate::error::{MonitorError, Result};

const REPORT_PREFIX: &str = "Nmap scan report for ";
const MAC_PREFIX: &str = "MAC Address: ";
const SUMMARY_PREFIX: &str = "Nmap done:";

/// Hosts-up count and elapsed time from the summary line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSummary {
    pub hosts_up: u32,
    pub elapsed_secs: f64,
}

/// Parsed result of one sweep.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub hosts: Vec<DiscoveredHost>,
    pub summary: ScanSummary,
}

/// Parse nmap text output captured at `scan_time` (epoch seconds).
///
/// Malformed host blocks are dropped silently; a missing summary line fails
/// the parse since the output cannot be trusted to be complete.
pub fn parse_scan(text: &str, scan_time: i64) -> Result<ScanReport> {
    let summary = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with(SUMMARY_PREFIX))
        .and_then(parse_summary)
        .ok_or(MonitorError::MissingSummary)?;

    let mut hosts = Vec::new();
    let mut current_ip: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if let Some(target) = line.strip_prefix(REPORT_PREFIX) {
            current_ip = Some(report_ip(target).to_string());
        } else if line.starts_with(SUMMARY_PREFIX) {
            current_ip = None;
        } else if let Some(rest) = line.strip_prefix(MAC_PREFIX) {
            // One MAC per block; a stray MAC line outside a block is ignored.
            let Some(ip) = current_ip.take() else {
                continue;
            };
            let (mac, description) = split_mac_line(rest);
            if mac.is_empty() {
                continue;
            }
            hosts.push(DiscoveredHost {
                ip_address: ip,
                mac_address: MacAddr::new(mac),
                timestamp: scan_time,
                description: description.to_string(),
            });
        }
    }

    Ok(ScanReport { hosts, summary })
}

/// `host.lan (10.0.0.2)` → `10.0.0.2`; a bare address is returned as is.
fn report_ip(target: &str) -> &str {
    let target = target.trim();
    match (target.rfind('('), target.ends_with(')')) {
        (Some(open), true) => &target[open + 1..target.len() - 1],
        _ => target,
    }
}

/// `44:55:55:44:44:22 (Vendor Name)` → (`44:55:...`, `Vendor Name`).
fn split_mac_line(rest: &str) -> (&str, &str) {
    let rest = rest.trim();
    match rest.split_once(' ') {
        Some((mac, tail)) => {
            let tail = tail.trim();
            let description = tail
                .strip_prefix('(')
                .and_then(|t| t.strip_suffix(')'))
                .unwrap_or(tail);
            (mac, description)
        }
        None => (rest, ""),
    }
}

fn parse_summary(line: &str) -> Option<ScanSummary> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;
    let hosts_up = line[open + 1..close]
        .split_whitespace()
        .find_map(|word| word.parse::<u32>().ok())?;

    let after_in = &line[line.rfind(" in ")? + 4..];
    let elapsed_secs = after_in
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<f64>().ok())?;

    Some(ScanSummary {
        hosts_up,
        elapsed_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWEEP_TEXT: &str = "Starting Nmap 7.70 ( https://nmap.org ) at 2022-04-16 17:05 +07
        Nmap scan report for 192.168.1.99
        Host is up (0.29s latency).
        MAC Address: 44:55:55:44:44:22 (New found dummy device)
        Nmap scan report for router.lan (192.168.1.1)
        Host is up (0.01s latency).
        MAC Address: 5E:02:14:00:F4:94 (Unknown)
        Nmap scan report for 192.168.1.117
        Host is up.
        Nmap done: 256 IP addresses (3 hosts up) scanned in 10.57 seconds";

    #[test]
    fn test_parse_sweep() {
        let report = parse_scan(SWEEP_TEXT, 1_000).unwrap();
        assert_eq!(report.summary.hosts_up, 3);
        assert!((report.summary.elapsed_secs - 10.57).abs() < f64::EPSILON);

        // The MAC-less local host is skipped.
        assert_eq!(report.hosts.len(), 2);

        let first = &report.hosts[0];
        assert_eq!(first.ip_address, "192.168.1.99");
        assert_eq!(first.mac_address.as_str(), "44:55:55:44:44:22");
        assert_eq!(first.description, "New found dummy device");
        assert_eq!(first.timestamp, 1_000);

        let router = &report.hosts[1];
        assert_eq!(router.ip_address, "192.168.1.1");
        assert_eq!(router.description, "Unknown");
    }

    #[test]
    fn test_mac_line_without_description() {
        let text = "Nmap scan report for 10.0.0.5
MAC Address: AA:BB:CC:DD:EE:05
Nmap done: 1 IP address (1 host up) scanned in 0.40 seconds";

        let report = parse_scan(text, 0).unwrap();
        assert_eq!(report.hosts.len(), 1);
        assert_eq!(report.hosts[0].description, "");
        assert_eq!(report.summary.hosts_up, 1);
    }

    #[test]
    fn test_mac_not_attributed_across_blocks() {
        let text = "Nmap scan report for 10.0.0.1
Host is up.
Nmap scan report for 10.0.0.2
Host is up (0.01s latency).
MAC Address: AA:BB:CC:DD:EE:02 (Acme)
Nmap done: 256 IP addresses (2 hosts up) scanned in 2.00 seconds";

        let report = parse_scan(text, 0).unwrap();
        assert_eq!(report.hosts.len(), 1);
        assert_eq!(report.hosts[0].ip_address, "10.0.0.2");
    }

    #[test]
    fn test_no_hosts_up() {
        let text = "Starting Nmap 7.94
Nmap done: 256 IP addresses (0 hosts up) scanned in 26.11 seconds";

        let report = parse_scan(text, 0).unwrap();
        assert!(report.hosts.is_empty());
        assert_eq!(report.summary.hosts_up, 0);
    }

    #[test]
    fn test_garbage_blocks_yield_nothing() {
        let text = "Nmap scan report for
MAC Address:
random noise
Nmap done: 256 IP addresses (1 host up) scanned in 1.00 seconds";

        let report = parse_scan(text, 0).unwrap();
        assert!(report.hosts.is_empty());
    }

    #[test]
    fn test_missing_summary_fails() {
        let text = "Nmap scan report for 10.0.0.2
MAC Address: AA:BB:CC:DD:EE:02 (Acme)";

        assert!(matches!(
            parse_scan(text, 0),
            Err(MonitorError::MissingSummary)
        ));
        assert!(matches!(parse_scan("", 0), Err(MonitorError::MissingSummary)));
    }
}
