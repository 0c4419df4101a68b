// # signage-core
//
// Core library for the signage configuration service.
//
// Remote signage terminals cannot receive pushes; they poll. This crate holds
// the current configuration for every terminal and makes each administrator
// write visible to the next poll, whole and never torn.
//
// ## Architecture Overview
//
// - **normalize**: Turns an untrusted upsert payload into normalized settings
// - **ConfigStore**: Trait for keyed per-device storage (memory or file)
// - **DistributionGateway**: List / fetch / upsert calls shared by the admin
//   surface and polling devices
//
// ## Design Principles
//
// 1. **Normalize at the edge**: Stored records are always complete and in range
// 2. **Whole-record replacement**: Upserts replace, they never merge
// 3. **Store-owned timestamps**: `updatedAt` is assigned by the store only
// 4. **Pull-based**: No background tasks; devices re-poll for changes
// 5. **Library-First**: Transport and daemon live in separate crates

pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{AccessConfig, ServerConfig, SignageConfig, StoreConfig};
pub use error::{Error, Result};
pub use gateway::DistributionGateway;
pub use model::{DeviceConfiguration, DeviceSettings, Layout, Orientation, ScreenConfig};
pub use normalize::{NormalizedUpsert, normalize};
pub use state::{FileConfigStore, MemoryConfigStore, open_store};
pub use traits::{ConfigStore, DeviceMap};
