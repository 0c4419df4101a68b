//! Core traits for the signage system
//!
//! - [`ConfigStore`]: Keyed storage of per-device configuration records

pub mod config_store;

pub use config_store::{ConfigStore, DeviceMap};
