//! Distribution gateway
//!
//! The DistributionGateway is responsible for:
//! - Serving the full device map to admins and polling devices
//! - Serving a single device's record
//! - Running admin payloads through the normalizer and into the store
//!
//! ## Architecture
//!
//! ```text
//!   admin payload                         device poll
//!        │                                     │
//!        ▼                                     ▼
//! ┌──────────────┐                    ┌────────────────────┐
//! │  normalize   │── NormalizedUpsert ▶│ DistributionGateway │
//! └──────────────┘                    └────────────────────┘
//!                                              │
//!                                              ▼
//!                                      ┌──────────────┐
//!                                      │ ConfigStore  │
//!                                      └──────────────┘
//! ```
//!
//! The gateway holds no state of its own. Every call is independent and may
//! run concurrently with any other; consistency comes from the store.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::model::DeviceConfiguration;
use crate::normalize::normalize;
use crate::traits::{ConfigStore, DeviceMap};

/// Request handler shared by the admin surface and polling devices
#[derive(Clone)]
pub struct DistributionGateway {
    store: Arc<dyn ConfigStore>,
}

impl DistributionGateway {
    /// Create a gateway over a store
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Every stored record, keyed by device identifier
    pub async fn list(&self) -> Result<DeviceMap> {
        let devices = self.store.get_all().await.inspect_err(|e| {
            error!(error = %e, "Failed to list device configurations");
        })?;
        debug!(records = devices.len(), "Listed device configurations");
        Ok(devices)
    }

    /// The record for one device
    pub async fn fetch(&self, device_id: &str) -> Result<DeviceConfiguration> {
        match self.store.get_one(device_id).await {
            Ok(record) => {
                debug!(device_id, "Fetched device configuration");
                Ok(record)
            }
            Err(Error::NotFound(id)) => {
                debug!(device_id = %id, "Device configuration not found");
                Err(Error::NotFound(id))
            }
            Err(e) => {
                error!(device_id, error = %e, "Failed to fetch device configuration");
                Err(e)
            }
        }
    }

    /// Validate, normalize and store a raw payload
    ///
    /// Returns the record exactly as stored, including the server-assigned
    /// `updatedAt`, so the caller can re-render authoritative values.
    pub async fn upsert(&self, payload: &Value) -> Result<DeviceConfiguration> {
        let upsert = normalize(payload).inspect_err(|e| {
            warn!(error = %e, "Rejected device configuration");
        })?;

        match self.store.upsert(&upsert.device_id, upsert.settings).await {
            Ok(record) => {
                info!(
                    device_id = %upsert.device_id,
                    layout = record.settings.layout.as_str(),
                    updated_at = record.updated_at,
                    "Stored device configuration"
                );
                Ok(record)
            }
            Err(e) => {
                error!(
                    device_id = %upsert.device_id,
                    error = %e,
                    "Failed to store device configuration"
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for DistributionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionGateway").finish_non_exhaustive()
    }
}
