// # Config Store Implementations
//
// This module provides implementations of the ConfigStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;

use std::sync::Arc;

use crate::Error;
use crate::config::StoreConfig;
use crate::traits::ConfigStore;

/// Open the store described by `config`
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn ConfigStore>, Error> {
    config.validate()?;
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryConfigStore::new())),
        StoreConfig::File { path } => Ok(Arc::new(FileConfigStore::new(path).await?)),
    }
}

/// Reject identifiers the store must never hold
pub(crate) fn ensure_identifier(device_id: &str) -> Result<(), Error> {
    if device_id.is_empty() {
        return Err(Error::invalid_identifier("deviceId must not be empty"));
    }
    Ok(())
}

/// Write time for a record, never earlier than the key's previous stamp
pub(crate) fn next_stamp(previous: Option<i64>) -> i64 {
    let now = chrono::Utc::now().timestamp();
    previous.map_or(now, |prev| now.max(prev))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_store_memory() {
        let store = open_store(&StoreConfig::Memory).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn open_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.json");
        let config = StoreConfig::File {
            path: path.to_string_lossy().into_owned(),
        };

        let store = open_store(&config).await.unwrap();
        store
            .upsert("lobby", crate::model::DeviceSettings::default())
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_store_rejects_empty_path() {
        let config = StoreConfig::File {
            path: String::new(),
        };
        assert!(matches!(
            open_store(&config).await,
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn stamp_is_monotonic() {
        let now = chrono::Utc::now().timestamp();
        assert!(next_stamp(None) >= now);
        assert_eq!(next_stamp(Some(now + 1000)), now + 1000);
    }
}
