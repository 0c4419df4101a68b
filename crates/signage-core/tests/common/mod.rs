//! Test doubles and common utilities for store contract tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use signage_core::error::{Error, Result};
use signage_core::model::{DeviceConfiguration, DeviceSettings};
use signage_core::state::MemoryConfigStore;
use signage_core::traits::{ConfigStore, DeviceMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A store whose persistence layer is always down
#[derive(Default)]
pub struct UnavailableStore {
    upsert_call_count: AtomicUsize,
}

impl UnavailableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of times upsert() was called
    pub fn upsert_call_count(&self) -> usize {
        self.upsert_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for UnavailableStore {
    async fn get_all(&self) -> Result<DeviceMap> {
        Err(Error::storage("backend offline"))
    }

    async fn get_one(&self, _device_id: &str) -> Result<DeviceConfiguration> {
        Err(Error::storage("backend offline"))
    }

    async fn upsert(&self, _device_id: &str, _settings: DeviceSettings) -> Result<DeviceConfiguration> {
        self.upsert_call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::storage("backend offline"))
    }

    async fn count(&self) -> Result<usize> {
        Err(Error::storage("backend offline"))
    }
}

/// A memory store that counts the calls reaching it
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryConfigStore,
    upsert_call_count: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of times upsert() was called
    pub fn upsert_call_count(&self) -> usize {
        self.upsert_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for CountingStore {
    async fn get_all(&self) -> Result<DeviceMap> {
        self.inner.get_all().await
    }

    async fn get_one(&self, device_id: &str) -> Result<DeviceConfiguration> {
        self.inner.get_one(device_id).await
    }

    async fn upsert(&self, device_id: &str, settings: DeviceSettings) -> Result<DeviceConfiguration> {
        self.upsert_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(device_id, settings).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

/// Minimal valid payload for a device
pub fn payload(device_id: &str) -> Value {
    json!({
        "deviceId": device_id,
        "webUrl": "x",
        "videoUrl": "y",
        "layout": "split"
    })
}

/// Payload whose every field is derived from `n`
///
/// A record read back from such a payload is consistent only if all of its
/// fields carry the same `n`; any mix means a torn read or a merge.
pub fn tagged_payload(device_id: &str, n: u16) -> Value {
    json!({
        "deviceId": device_id,
        "webUrl": format!("https://web/{n}"),
        "videoUrl": format!("https://video/{n}"),
        "layout": if n % 2 == 0 { "web_only" } else { "video_only" },
        "screen": {
            "orientation": if n % 2 == 0 { "column" } else { "row" },
            "splitRatio": n % 101,
            "gapPx": n % 201,
            "paddingPx": n % 201
        }
    })
}

/// Recover `n` from a record written by [`tagged_payload`], if consistent
pub fn tag_of(record: &DeviceConfiguration) -> Option<u16> {
    let n: u16 = record.settings.web_url.strip_prefix("https://web/")?.parse().ok()?;
    let expected = signage_core::normalize(&tagged_payload("_", n)).ok()?.settings;
    (record.settings == expected).then_some(n)
}
