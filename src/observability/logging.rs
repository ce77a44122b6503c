//! # Structured Logging
//!
//! Provides structured logging macros and subscriber setup using the tracing ecosystem.
//! Secret values never appear in log fields; only identifiers, keys and counts do.

use crate::config::ObservabilityConfig;
use crate::errors::{MirrorError, Result};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for one refresh cycle.
///
/// ```rust,ignore
/// let span = refresh_span!("background", store = "https://kv.example.net");
/// ```
#[macro_export]
macro_rules! refresh_span {
    ($trigger:expr) => {
        tracing::info_span!(
            "refresh_cycle",
            trigger = %$trigger,
            cycle_id = %uuid::Uuid::new_v4()
        )
    };
    ($trigger:expr, $($field:tt)*) => {
        tracing::info_span!(
            "refresh_cycle",
            trigger = %$trigger,
            cycle_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured log level when set. Fails if a global
/// subscriber has already been installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| MirrorError::config(format!("Invalid log level: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed =
        if config.json_logs { builder.json().try_init() } else { builder.try_init() };

    installed.map_err(|e| MirrorError::internal(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log mirror configuration at startup
pub fn log_config_info(config: &crate::config::MirrorConfig) {
    tracing::info!(
        store_address = %config.store.address,
        reload_interval_secs = ?config.reload_interval_secs,
        polling_enabled = config.reload_interval_secs.is_some(),
        "Secret mirror configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = refresh_span!("initial");
        let _span = refresh_span!("background", store = "kv-1");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = ObservabilityConfig {
            log_level: "secret_mirror=loud".to_string(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_log_config_info() {
        let config = crate::config::MirrorConfig::default();

        // This should not panic
        log_config_info(&config);
    }
}
