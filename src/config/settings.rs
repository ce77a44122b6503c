//! # Configuration Settings
//!
//! Defines the configuration structure for the secret mirror.

use crate::errors::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct MirrorConfig {
    /// Remote secret store configuration
    #[validate(nested)]
    pub store: StoreConfig,

    /// Seconds between background refresh cycles; unset disables polling
    #[validate(range(min = 1, message = "Reload interval must be at least 1 second"))]
    pub reload_interval_secs: Option<u64>,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl MirrorConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(MirrorError::from)?;
        Ok(())
    }

    /// Reload interval as a Duration, if polling is enabled
    pub fn reload_interval(&self) -> Option<Duration> {
        self.reload_interval_secs.map(Duration::from_secs)
    }

    /// Convert into the runtime options consumed by [`crate::SecretMirror`]
    pub fn to_options(&self) -> Result<MirrorOptions> {
        self.validate()?;
        MirrorOptions::new(self.store.address.clone(), self.reload_interval())
    }
}

/// Remote secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Store address or identifier passed to the store client when listing
    #[validate(length(min = 1, message = "Store address cannot be empty"))]
    pub address: String,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when `RUST_LOG` is not set
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,

    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            service_name: crate::APP_NAME.to_string(),
        }
    }
}

/// Validated runtime options for a [`crate::SecretMirror`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOptions {
    store_address: String,
    reload_interval: Option<Duration>,
}

impl MirrorOptions {
    /// Build options, rejecting an empty store address and a zero reload interval
    pub fn new(
        store_address: impl Into<String>,
        reload_interval: Option<Duration>,
    ) -> Result<Self> {
        let store_address = store_address.into();
        if store_address.trim().is_empty() {
            return Err(MirrorError::config("Store address is required"));
        }
        if reload_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(MirrorError::config("Reload interval must be strictly positive"));
        }
        Ok(Self { store_address, reload_interval })
    }

    /// Store address passed to the store client
    pub fn store_address(&self) -> &str {
        &self.store_address
    }

    /// Background polling interval, if polling is enabled
    pub fn reload_interval(&self) -> Option<Duration> {
        self.reload_interval
    }
}
