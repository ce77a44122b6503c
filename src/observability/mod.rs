//! # Observability Infrastructure
//!
//! Structured logging and metrics for the secret mirror.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{describe_metrics, record_refresh, record_refresh_failure};

use crate::config::ObservabilityConfig;
use crate::errors::Result;

/// Initialize logging and register metric descriptions
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;
    describe_metrics();
    Ok(())
}
