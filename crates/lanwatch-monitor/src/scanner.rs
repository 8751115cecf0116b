//! Nmap process wrapper.
//!
//! Runs an `nmap -sn` ping sweep as a child process via
//! `tokio::process::Command` and returns its text output for parsing.

use std::time::Instant;

use tokio::process::Command;

use crate::error::{MonitorError, Result};

/// Canned sweep output for dummy-scan mode.
pub const DUMMY_SCAN: &str = "Starting Nmap 7.70 ( https://nmap.org ) at 2022-04-16 17:05 +07
Nmap scan report for 192.168.1.99
Host is up (0.29s latency).
MAC Address: 44:55:55:44:44:22 (New found dummy device)
Nmap scan report for 192.168.1.125
Host is up (0.11s latency).
MAC Address: 5E:02:14:00:F4:94 (Unknown)
Nmap scan report for 192.168.1.117
Host is up.
Nmap done: 256 IP addresses (3 hosts up) scanned in 10.57 seconds
";

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
}

impl NmapScanner {
    pub fn new(nmap_path: &str) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
        }
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| MonitorError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a ping sweep of `target` and return nmap's text output.
    pub async fn sweep(&self, target: &str) -> Result<String> {
        let start = Instant::now();

        tracing::debug!(target = %target, "Starting nmap sweep");

        let output = Command::new(&self.nmap_path)
            .arg("-sn")
            .arg("--noninteractive")
            .arg(target)
            .output()
            .await
            .map_err(|e| MonitorError::NmapNotFound {
                path: format!("{}: {e}", self.nmap_path),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MonitorError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(MonitorError::EmptyScan);
        }

        tracing::debug!(
            target = %target,
            duration_ms = start.elapsed().as_millis(),
            "Nmap sweep finished"
        );

        Ok(text)
    }
}

/// Where a cycle's scan text comes from.
pub enum ScanSource {
    Nmap(NmapScanner),
    /// Fixed output, returned verbatim every cycle.
    Canned(String),
}

impl ScanSource {
    pub async fn sweep(&self, target: &str) -> Result<String> {
        match self {
            Self::Nmap(scanner) => scanner.sweep(target).await,
            Self::Canned(text) => {
                tracing::debug!(target = %target, "Dummy scan");
                Ok(text.clone())
            }
        }
    }
}
