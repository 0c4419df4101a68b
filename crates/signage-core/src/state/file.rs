// # File Config Store
//
// File-based implementation of ConfigStore with crash recovery.
//
// ## Purpose
//
// Keeps device configuration across restarts. Administrators enter
// configuration rarely, so every upsert is written through to disk before it
// becomes visible to polling devices.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good snapshot
// - Recovery: Falls back to backup if corruption detected
// - Repair: Every loaded record is re-normalized; entries that are not
//   objects are dropped, the rest of the file is kept
//
// ## Locking
//
// Writers are serialized by an async mutex held across the disk write, in
// arrival order. Readers never take that mutex: they read the in-memory
// view, which is only updated after the snapshot is safely on disk.
//
// Once an upsert holds the mutex, the disk write and the in-memory update
// run in a spawned task that owns the guard. Dropping the caller's future
// (e.g. on a request timeout) cannot separate the two.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "devices": {
//     "lobby": {
//       "webUrl": "https://example.com",
//       "videoUrl": "",
//       "layout": "split",
//       "screen": { "orientation": "row", "splitRatio": 50, "gapPx": 0, "paddingPx": 0 },
//       "updatedAt": 1760600000
//     }
//   }
// }
// ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::memory::MemoryConfigStore;
use super::ensure_identifier;
use crate::Error;
use crate::model::{DeviceConfiguration, DeviceSettings};
use crate::normalize::normalize_settings;
use crate::traits::config_store::{ConfigStore, DeviceMap};

/// Snapshot file format version
/// Used for future migration if format changes
const STORE_FILE_VERSION: &str = "1.0";

/// File-based config store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use signage_core::state::FileConfigStore;
/// use signage_core::traits::ConfigStore;
/// use signage_core::model::DeviceSettings;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/var/lib/signage/configs.json").await?;
///
///     // Written to disk before it is returned
///     store.upsert("lobby", DeviceSettings::default()).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    /// Records visible to readers
    records: MemoryConfigStore,
    /// Serializes snapshot writes
    writer: Arc<Mutex<()>>,
}

/// Snapshot file format as written
#[derive(Debug, serde::Serialize)]
struct StoreFileFormat<'a> {
    version: &'a str,
    devices: &'a DeviceMap,
}

/// Snapshot file format as read; entries are repaired one by one
#[derive(Debug, serde::Deserialize)]
struct RawStoreFile {
    version: String,
    devices: BTreeMap<String, Value>,
}

/// Outcome of reading one snapshot file
enum ReadOutcome {
    Missing,
    Loaded(DeviceMap),
    Corrupt(serde_json::Error),
}

impl FileConfigStore {
    /// Create or load a file config store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing snapshot
    /// 3. If it is corrupt, try to load the backup
    /// 4. If both fail, start with an empty store
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = Self::load_with_recovery(&path).await?;
        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "Opened file config store"
        );

        Ok(Self {
            path,
            records: MemoryConfigStore::from_records(records),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, falling back to the backup when it is corrupt
    async fn load_with_recovery(path: &Path) -> Result<DeviceMap, Error> {
        let err = match Self::read_snapshot(path).await? {
            ReadOutcome::Missing => {
                tracing::debug!("Store file does not exist: {}", path.display());
                return Ok(DeviceMap::new());
            }
            ReadOutcome::Loaded(records) => return Ok(records),
            ReadOutcome::Corrupt(err) => err,
        };

        tracing::warn!(
            "Store file {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            err
        );

        let backup_path = Self::backup_path(path);
        match Self::read_snapshot(&backup_path).await {
            Ok(ReadOutcome::Loaded(records)) => {
                tracing::info!("Recovered store from backup: {} records", records.len());

                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!(
                        "Failed to restore store file from backup: {}",
                        restore_err
                    );
                }

                Ok(records)
            }
            Ok(ReadOutcome::Missing) => {
                tracing::warn!("No backup file found. Starting with empty store.");
                Ok(DeviceMap::new())
            }
            Ok(ReadOutcome::Corrupt(backup_err)) => {
                tracing::error!(
                    "Backup also corrupted: {}. Starting with empty store.",
                    backup_err
                );
                Ok(DeviceMap::new())
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup unreadable: {}. Starting with empty store.",
                    backup_err
                );
                Ok(DeviceMap::new())
            }
        }
    }

    /// Read and parse one snapshot file
    async fn read_snapshot(path: &Path) -> Result<ReadOutcome, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ReadOutcome::Missing),
            Err(e) => {
                return Err(Error::storage(format!(
                    "Failed to read store file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let snapshot: RawStoreFile = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => return Ok(ReadOutcome::Corrupt(e)),
        };

        if snapshot.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STORE_FILE_VERSION,
                snapshot.version
            );
        }

        Ok(ReadOutcome::Loaded(Self::repair_records(snapshot.devices)))
    }

    /// Normalize every loaded entry, keeping its stored `updatedAt`
    fn repair_records(raw: BTreeMap<String, Value>) -> DeviceMap {
        let mut devices = DeviceMap::new();
        for (device_id, entry) in raw {
            if device_id.is_empty() || !entry.is_object() {
                tracing::warn!(device_id = %device_id, "Dropping unreadable stored record");
                continue;
            }

            let updated_at = match entry.get("updatedAt").and_then(Value::as_i64) {
                Some(stamp) => stamp,
                None => {
                    tracing::warn!(device_id = %device_id, "Stored record has no updatedAt, using 0");
                    0
                }
            };

            let record = DeviceConfiguration::stamped(normalize_settings(&entry), updated_at);
            if serde_json::to_value(&record).ok().as_ref() != Some(&entry) {
                tracing::warn!(device_id = %device_id, "Stored record normalized on load");
            }
            devices.insert(device_id, record);
        }
        devices
    }

    /// Write a snapshot to disk atomically
    async fn write_snapshot(path: &Path, devices: &DeviceMap) -> Result<(), Error> {
        let snapshot = StoreFileFormat {
            version: STORE_FILE_VERSION,
            devices,
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::storage(format!("Failed to serialize store: {}", e)))?;

        // Write to temporary file first
        let temp_path = Self::temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::storage(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous good snapshot around
        if path.exists() {
            let backup_path = Self::backup_path(path);
            if let Err(e) = fs::copy(path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("Store written to file: {}", path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.to_path_buf();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get_all(&self) -> Result<DeviceMap, Error> {
        self.records.get_all().await
    }

    async fn get_one(&self, device_id: &str) -> Result<DeviceConfiguration, Error> {
        self.records.get_one(device_id).await
    }

    async fn upsert(
        &self,
        device_id: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceConfiguration, Error> {
        ensure_identifier(device_id)?;

        // Cancelling while queued here leaves no trace.
        let guard = Arc::clone(&self.writer).lock_owned().await;

        let path = self.path.clone();
        let records = self.records.clone();
        let device_id = device_id.to_string();

        let write = tokio::spawn(async move {
            let _guard = guard;

            let record = records.prepare(&device_id, settings);
            let mut devices = records.snapshot();
            devices.insert(device_id.clone(), record.clone());

            // Nothing becomes visible unless the snapshot reached disk.
            FileConfigStore::write_snapshot(&path, &devices).await?;
            records.put(&device_id, record.clone());

            Ok::<_, Error>(record)
        });

        write.await?
    }

    async fn count(&self) -> Result<usize, Error> {
        self.records.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layout, ScreenConfig};
    use std::time::Duration;
    use tempfile::tempdir;

    fn settings(web_url: &str) -> DeviceSettings {
        DeviceSettings {
            web_url: web_url.to_string(),
            ..DeviceSettings::default()
        }
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(store.path(), path);

        // Initially empty
        assert_eq!(store.count().await.unwrap(), 0);

        let stored = store
            .upsert(
                "lobby",
                DeviceSettings {
                    web_url: "https://a".into(),
                    video_url: "https://b".into(),
                    layout: Layout::WebOnly,
                    screen: ScreenConfig {
                        split_ratio: 70,
                        ..ScreenConfig::default()
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(store.get_one("lobby").await.unwrap(), stored);
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(store2.get_one("lobby").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("configs.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        store.upsert("lobby", settings("x")).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        let first = store.upsert("lobby", settings("https://first")).await.unwrap();

        // Second write moves the first snapshot into the backup
        store.upsert("lobby", settings("https://second")).await.unwrap();

        let backup_path = FileConfigStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileConfigStore::new(&path).await.unwrap();
        let recovered = store2.get_one("lobby").await.unwrap();
        assert_eq!(
            recovered, first,
            "Backup should contain previous snapshot, not latest"
        );
    }

    #[tokio::test]
    async fn test_file_store_corruption_without_backup_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let store = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_store_failed_write_is_not_visible() {
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let path = store_dir.join("configs.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        let kept = store.upsert("lobby", settings("https://kept")).await.unwrap();

        // Pull the directory out from under the store
        std::fs::remove_dir_all(&store_dir).unwrap();

        let err = store
            .upsert("lobby", settings("https://lost"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));

        let err = store.upsert("hall", settings("https://lost")).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));

        assert_eq!(store.get_one("lobby").await.unwrap(), kept);
        assert!(matches!(
            store.get_one("hall").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_file_store_sequential_writes_persist_last() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        for i in 0..10 {
            store
                .upsert("lobby", settings(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }

        let store2 = FileConfigStore::new(&path).await.unwrap();
        let last = store2.get_one("lobby").await.unwrap();
        assert_eq!(last.settings.web_url, "https://example.com/9");
    }

    #[tokio::test]
    async fn test_file_store_rejects_empty_identifier() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        let err = store.upsert("", settings("x")).await.unwrap_err();

        assert!(matches!(err, Error::InvalidIdentifier(_)));
        assert!(!path.exists(), "Rejected write must not touch disk");
    }

    #[tokio::test]
    async fn test_file_store_normalizes_loaded_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");
        let snapshot = serde_json::json!({
            "version": "1.0",
            "devices": {
                "lobby": {
                    "webUrl": "https://a",
                    "videoUrl": "https://b",
                    "layout": "split",
                    "screen": { "orientation": "row", "splitRatio": 250, "gapPx": 60000, "paddingPx": 999 },
                    "updatedAt": 1700000000
                },
                "hall": {
                    "webUrl": "https://c",
                    "layout": "picture_in_picture",
                    "updatedAt": 1700000001
                },
                "broken": "not a record"
            }
        });
        fs::write(&path, snapshot.to_string()).await.unwrap();

        let store = FileConfigStore::new(&path).await.unwrap();

        let lobby = store.get_one("lobby").await.unwrap();
        assert_eq!(lobby.settings.screen.split_ratio, 100);
        assert_eq!(lobby.settings.screen.gap_px, 200);
        assert_eq!(lobby.settings.screen.padding_px, 200);
        assert_eq!(lobby.updated_at, 1_700_000_000);

        // One bad layout does not make the whole file corrupt
        let hall = store.get_one("hall").await.unwrap();
        assert_eq!(hall.settings.layout, Layout::Split);
        assert_eq!(hall.settings.web_url, "https://c");
        assert_eq!(hall.settings.screen, ScreenConfig::default());

        assert!(matches!(
            store.get_one("broken").await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_file_store_cancelled_upsert_keeps_disk_and_memory_in_step() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");
        let store = FileConfigStore::new(&path).await.unwrap();

        for k in 0..40u64 {
            let device_id = format!("d{k}");
            let _ = tokio::time::timeout(
                Duration::from_micros(25 * k),
                store.upsert(&device_id, settings(&format!("https://example.com/{k}"))),
            )
            .await;

            // Wait out any write still in flight
            drop(store.writer.lock().await);

            let reopened = FileConfigStore::new(&path).await.unwrap();
            assert_eq!(
                reopened.get_all().await.unwrap(),
                store.get_all().await.unwrap(),
                "disk and memory disagree after {device_id}"
            );
        }
    }

    #[tokio::test]
    async fn test_file_store_upsert_completes_after_caller_gives_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");
        let store = FileConfigStore::new(&path).await.unwrap();

        // A zero timeout drops the upsert right after its first poll
        let _ = tokio::time::timeout(Duration::ZERO, store.upsert("lobby", settings("https://late")))
            .await;
        drop(store.writer.lock().await);

        let in_memory = store.get_one("lobby").await.unwrap();
        let reopened = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(reopened.get_one("lobby").await.unwrap(), in_memory);
    }
}
