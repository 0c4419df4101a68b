//! Configuration types for the signage system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignageConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Config store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Shared credential for the access gate
    #[serde(default)]
    pub access: AccessConfig,
}

impl SignageConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.server.validate()?;
        self.store.validate()?;
        self.access.validate()?;
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Validate the server configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::Error::config(format!(
                "Bind address '{}' is not a valid socket address",
                self.bind_address
            )));
        }
        if !(1..=300).contains(&self.request_timeout_secs) {
            return Err(crate::Error::config(format!(
                "Request timeout must be between 1 and 300 seconds. Got: {}",
                self.request_timeout_secs
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Config store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-based store
    File {
        /// Path to the snapshot file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("File store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
        }
    }
}

/// Shared credential checked by the access gate
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Basic-auth user name
    #[serde(default = "default_username")]
    pub username: String,

    /// Basic-auth password
    #[serde(default = "default_password")]
    pub password: String,
}

impl AccessConfig {
    /// Create an access configuration
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validate the access configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.username.is_empty() {
            return Err(crate::Error::config("Access user name cannot be empty"));
        }
        // Basic auth splits on the first colon.
        if self.username.contains(':') {
            return Err(crate::Error::config("Access user name cannot contain ':'"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("Access password cannot be empty"));
        }
        Ok(())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl std::fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "1234".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SignageConfig::new();
        config.validate().unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.access.username, "admin");
    }

    #[test]
    fn store_config_is_tagged() {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "type": "file", "path": "/var/lib/signage.json" }"#).unwrap();
        assert_eq!(
            config,
            StoreConfig::File {
                path: "/var/lib/signage.json".into()
            }
        );
        assert_eq!(config.type_name(), "file");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = SignageConfig::new();
        config.server.bind_address = "not-an-address".into();
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));

        let mut config = SignageConfig::new();
        config.server.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = SignageConfig::new();
        config.store = StoreConfig::File { path: String::new() };
        assert!(config.validate().is_err());

        let mut config = SignageConfig::new();
        config.access = AccessConfig::new("ad:min", "secret");
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let access = AccessConfig::new("admin", "hunter2");
        let debug = format!("{access:?}");
        assert!(!debug.contains("hunter2"));
    }
}
