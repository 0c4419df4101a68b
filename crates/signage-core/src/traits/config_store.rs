// # Config Store Trait
//
// Defines the interface for per-device configuration storage.
//
// ## Purpose
//
// The config store holds the current truth for every device. Devices have
// no push channel; they poll, and the next poll after a write completes must
// observe that write in full.
//
// ## Implementations
//
// - Memory: sharded in-process map, no persistence
// - File: JSON snapshot with atomic rename and backup recovery
//
// ## Usage
//
// ```rust
// use signage_core::{ConfigStore, MemoryConfigStore, normalize};
//
// #[tokio::main]
// async fn main() -> signage_core::Result<()> {
//     let store = MemoryConfigStore::new();
//
//     let upsert = normalize(&serde_json::json!({ "deviceId": "lobby", "webUrl": "https://a" }))?;
//     let stored = store.upsert(&upsert.device_id, upsert.settings).await?;
//
//     assert_eq!(store.get_one("lobby").await?, stored);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::model::{DeviceConfiguration, DeviceSettings};

/// Snapshot of every stored record, keyed by device identifier
pub type DeviceMap = BTreeMap<String, DeviceConfiguration>;

/// Trait for config store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Consistency
///
/// - Records are replaced whole. A reader sees either the previous record or
///   the new one, never a mix of fields from both.
/// - Two concurrent upserts to the same device are applied one after the
///   other in arrival order; the later one wins in full.
/// - `updatedAt` is assigned by the store and never decreases for a key.
///
/// # Locking
///
/// Reads hold a lock only long enough to clone records out. No lock that a
/// reader needs is held across disk I/O, so a slow poll never blocks an
/// administrator write and the reverse.
///
/// # Failure
///
/// - Empty identifiers are rejected with `InvalidIdentifier`, even though the
///   normalizer screens them first.
/// - A write that cannot be persisted returns `StorageUnavailable` and is not
///   made visible to readers.
/// - No retries happen inside the store.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Return every stored record
    ///
    /// An empty store yields an empty map, never an error.
    async fn get_all(&self) -> Result<DeviceMap, crate::Error>;

    /// Return the record for one device
    ///
    /// # Returns
    ///
    /// - `Ok(DeviceConfiguration)`: The stored record
    /// - `Err(Error::NotFound)`: No record for this device
    /// - `Err(Error)`: Storage error
    async fn get_one(&self, device_id: &str) -> Result<DeviceConfiguration, crate::Error>;

    /// Create or fully replace the record for a device
    ///
    /// Stamps `updatedAt` with the store's clock and returns the record
    /// exactly as stored.
    ///
    /// # Parameters
    ///
    /// - `device_id`: Non-empty device identifier
    /// - `settings`: Normalized settings (see [`crate::normalize`])
    async fn upsert(
        &self,
        device_id: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceConfiguration, crate::Error>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, crate::Error>;
}
