//! Optional metrics instrumentation.
//!
//! With the `observe` feature enabled, the sync core emits counters, histograms
//! and gauges via the [`metrics`] crate; the host application installs a
//! recorder. Without the feature every function here is a no-op.

use crate::types::Component;

/// Record a delta applied in place.
///
/// - `shades.delta.applied_total` – counter with `projection` label
#[inline]
pub fn record_delta_applied(projection: &str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("shades.delta.applied_total", "projection" => projection.to_string())
            .increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = projection;
    }
}

/// Record a recovery load (single-key fetch from the store).
///
/// - `shades.recovery.loads_total` – counter with `outcome` label
/// - `shades.recovery.duration_seconds` – histogram
#[inline]
pub fn record_recovery_load(duration: std::time::Duration, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("shades.recovery.loads_total", "outcome" => outcome).increment(1);
        metrics::histogram!("shades.recovery.duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, success);
    }
}

/// Record a failed ingestion.
///
/// - `shades.ingest.failures_total` – counter
#[inline]
pub fn record_ingest_failure() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("shades.ingest.failures_total").increment(1);
    }
}

/// Record a bulk reload.
///
/// - `shades.reload.total` – counter with `outcome` label
/// - `shades.reload.duration_seconds` – histogram
/// - `shades.reload.namespaces` – gauge of namespaces rebuilt by the last reload
#[inline]
pub fn record_reload(duration: std::time::Duration, namespaces: usize, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("shades.reload.total", "outcome" => outcome).increment(1);
        metrics::histogram!("shades.reload.duration_seconds").record(duration.as_secs_f64());
        if success {
            metrics::gauge!("shades.reload.namespaces").set(namespaces as f64);
        }
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, namespaces, success);
    }
}

/// Set the liveness gauge of an upstream component.
///
/// - `shades.health.up` – gauge (0/1) with `component` label
#[inline]
pub fn set_health(component: Component, up: bool) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("shades.health.up", "component" => component.as_str())
            .set(if up { 1.0 } else { 0.0 });
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (component, up);
    }
}

/// Record a reload-gate or key-lock wait.
///
/// - `shades.lock.wait_duration_seconds` – histogram
#[inline]
pub fn record_lock_wait(duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::histogram!("shades.lock.wait_duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = duration;
    }
}
