// # Memory Config Store
//
// In-memory implementation of ConfigStore.
//
// ## Purpose
//
// Fast store with no persistence across restarts. Useful for tests, demos,
// and deployments where configuration is re-entered by an administrator
// after a restart.
//
// ## Locking
//
// Records live in a sharded map. An upsert holds only the shard lock of its
// own key, so writes to different devices do not wait on each other, and a
// read holds a shard lock only while cloning one record out.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use super::{ensure_identifier, next_stamp};
use crate::Error;
use crate::model::{DeviceConfiguration, DeviceSettings};
use crate::traits::config_store::{ConfigStore, DeviceMap};

/// In-memory config store implementation
///
/// # Example
///
/// ```rust,no_run
/// use signage_core::state::MemoryConfigStore;
/// use signage_core::traits::ConfigStore;
/// use signage_core::model::DeviceSettings;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryConfigStore::new();
///
///     let stored = store.upsert("lobby", DeviceSettings::default()).await?;
///     assert_eq!(store.get_one("lobby").await?, stored);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    records: Arc<DashMap<String, DeviceConfiguration>>,
}

impl MemoryConfigStore {
    /// Create a new empty memory config store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    ///
    /// Used by [`super::FileConfigStore`] to hold its loaded snapshot.
    pub(crate) fn from_records(records: DeviceMap) -> Self {
        let store = Self::new();
        for (device_id, record) in records {
            if device_id.is_empty() {
                tracing::warn!("Skipping stored record with empty device id");
                continue;
            }
            store.records.insert(device_id, record);
        }
        store
    }

    /// Compute the record an upsert would store, without storing it
    pub(crate) fn prepare(&self, device_id: &str, settings: DeviceSettings) -> DeviceConfiguration {
        let previous = self.records.get(device_id).map(|r| r.updated_at);
        DeviceConfiguration::stamped(settings, next_stamp(previous))
    }

    /// Replace the record for `device_id` in a single shard-locked step
    pub(crate) fn replace(&self, device_id: &str, settings: DeviceSettings) -> DeviceConfiguration {
        match self.records.entry(device_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let record =
                    DeviceConfiguration::stamped(settings, next_stamp(Some(entry.get().updated_at)));
                entry.insert(record.clone());
                record
            }
            Entry::Vacant(entry) => {
                let record = DeviceConfiguration::stamped(settings, next_stamp(None));
                entry.insert(record.clone());
                record
            }
        }
    }

    /// Store an already-stamped record as is
    pub(crate) fn put(&self, device_id: &str, record: DeviceConfiguration) {
        self.records.insert(device_id.to_string(), record);
    }

    /// Clone out every record
    pub(crate) fn snapshot(&self) -> DeviceMap {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_all(&self) -> Result<DeviceMap, Error> {
        Ok(self.snapshot())
    }

    async fn get_one(&self, device_id: &str) -> Result<DeviceConfiguration, Error> {
        self.records
            .get(device_id)
            .map(|record| record.value().clone())
            .ok_or_else(|| Error::not_found(device_id))
    }

    async fn upsert(
        &self,
        device_id: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceConfiguration, Error> {
        ensure_identifier(device_id)?;
        Ok(self.replace(device_id, settings))
    }

    async fn count(&self) -> Result<usize, Error> {
        Ok(self.records.len())
    }
}
