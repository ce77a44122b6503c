//! # Metrics Collection
//!
//! Refresh cycle metrics recorded through the `metrics` facade. The embedding
//! application installs a recorder; without one these calls are no-ops.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

use crate::sync::RefreshOutcome;

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(
        "secret_mirror_refresh_cycles_total",
        Unit::Count,
        "Refresh cycles by trigger and outcome"
    );
    describe_counter!("secret_mirror_secrets_fetched_total", Unit::Count, "Secrets fetched");
    describe_counter!(
        "secret_mirror_secrets_reused_total",
        Unit::Count,
        "Secrets reused from the previous snapshot"
    );
    describe_counter!(
        "secret_mirror_secrets_removed_total",
        Unit::Count,
        "Secrets dropped since the previous snapshot"
    );
    describe_histogram!(
        "secret_mirror_refresh_duration_seconds",
        Unit::Seconds,
        "Refresh cycle duration"
    );
    describe_gauge!("secret_mirror_published_keys", Unit::Count, "Keys in the published data set");
}

/// Record a successful refresh cycle
pub fn record_refresh(trigger: &'static str, outcome: &RefreshOutcome, duration_secs: f64) {
    let result = if outcome.changed { "changed" } else { "unchanged" };
    counter!("secret_mirror_refresh_cycles_total", "trigger" => trigger, "outcome" => result)
        .increment(1);
    counter!("secret_mirror_secrets_fetched_total").increment(outcome.fetched as u64);
    counter!("secret_mirror_secrets_reused_total").increment(outcome.reused as u64);
    counter!("secret_mirror_secrets_removed_total").increment(outcome.removed as u64);
    histogram!("secret_mirror_refresh_duration_seconds", "trigger" => trigger)
        .record(duration_secs);
    gauge!("secret_mirror_published_keys").set(outcome.snapshot.data().len() as f64);
}

/// Record a failed refresh cycle
pub fn record_refresh_failure(trigger: &'static str) {
    counter!("secret_mirror_refresh_cycles_total", "trigger" => trigger, "outcome" => "failed")
        .increment(1);
}
