//! # Configuration Management
//!
//! Loads [`MirrorConfig`] from environment variables prefixed with
//! `SECRET_MIRROR__` (nested keys separated by `__`), or from any `config` source.

pub mod settings;

pub use settings::{MirrorConfig, MirrorOptions, ObservabilityConfig, StoreConfig};

use crate::errors::Result;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SECRET_MIRROR";

impl MirrorConfig {
    /// Create configuration from environment variables
    ///
    /// `SECRET_MIRROR__STORE__ADDRESS`, `SECRET_MIRROR__RELOAD_INTERVAL_SECS`,
    /// `SECRET_MIRROR__OBSERVABILITY__LOG_LEVEL` and so on.
    pub fn from_env() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true),
            )
            .build()?;
        Self::from_source(source)
    }

    /// Deserialize and validate configuration from an already-built source
    pub fn from_source(source: config::Config) -> Result<Self> {
        let config: MirrorConfig = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
