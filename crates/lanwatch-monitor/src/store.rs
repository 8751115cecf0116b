//! Device store: trait + JSON-file and in-memory implementations.
//!
//! The store is a whole-set load/save: every save replaces the persisted
//! records entirely. Uniqueness of MAC addresses is the caller's concern.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use lanwatch_core::types::DeviceRecord;

use crate::error::{MonitorError, Result};

/// Trait for device persistence backends.
pub trait DeviceStore {
    /// Read every persisted record.
    fn load(&self) -> Result<Vec<DeviceRecord>>;

    /// Replace the persisted records with `records`.
    fn save(&self, records: &[DeviceRecord]) -> Result<()>;
}

/// Stores records as a pretty-printed JSON array in a single file.
///
/// Saves go to a sibling `.tmp` file that is then renamed over the
/// target, so readers never observe a half-written database.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> MonitorError {
        MonitorError::Store {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl DeviceStore for JsonFileStore {
    fn load(&self) -> Result<Vec<DeviceRecord>> {
        let json = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let records: Vec<DeviceRecord> = serde_json::from_str(&json)?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "Device store loaded"
        );

        Ok(records)
    }

    fn save(&self, records: &[DeviceRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.tmp_path();

        let mut file = fs::File::create(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(e))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "Device store saved"
        );

        Ok(())
    }
}

/// Keeps records in memory and counts saves.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<Vec<DeviceRecord>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<DeviceRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            saves: Cell::new(0),
        }
    }

    /// Number of saves performed so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Snapshot of the currently stored records.
    pub fn records(&self) -> Vec<DeviceRecord> {
        self.records.borrow().clone()
    }
}

impl DeviceStore for MemoryStore {
    fn load(&self) -> Result<Vec<DeviceRecord>> {
        Ok(self.records.borrow().clone())
    }

    fn save(&self, records: &[DeviceRecord]) -> Result<()> {
        *self.records.borrow_mut() = records.to_vec();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanwatch_core::types::{DeviceStatus, MacAddr};

    fn record(mac: &str, status: DeviceStatus) -> DeviceRecord {
        DeviceRecord {
            mac_address: MacAddr::new(mac),
            ip_address: "10.0.0.9".to_string(),
            description: "Acme".to_string(),
            timestamp: 1_700_000_000,
            status,
        }
    }

    #[test]
    fn test_json_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));

        let records = vec![
            record("AA:BB:CC:DD:EE:01", DeviceStatus::Present),
            record("AA:BB:CC:DD:EE:02", DeviceStatus::Dead),
        ];
        store.save(&records).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, records);
        assert!(!dir.path().join("devices.json.tmp").exists());
    }

    #[test]
    fn test_json_store_save_replaces_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));

        store
            .save(&[
                record("AA:BB:CC:DD:EE:01", DeviceStatus::Present),
                record("AA:BB:CC:DD:EE:02", DeviceStatus::Present),
            ])
            .unwrap();
        store
            .save(&[record("AA:BB:CC:DD:EE:03", DeviceStatus::Absent)])
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].mac_address.as_str(), "AA:BB:CC:DD:EE:03");
    }

    #[test]
    fn test_json_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(matches!(store.load(), Err(MonitorError::Store { .. })));
    }

    #[test]
    fn test_json_store_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(MonitorError::StoreFormat(_))));
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::default();
        assert_eq!(store.save_count(), 0);

        store
            .save(&[record("AA:BB:CC:DD:EE:01", DeviceStatus::Present)])
            .unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
