//! Optional metrics instrumentation for Tessera.
//!
//! When the `observe` feature is enabled, key operations emit counters and
//! histograms via the [`metrics`] crate. A downstream application must
//! install a metrics recorder to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record an image accepted by a datastore.
///
/// - `tessera.datastore.images_total` – counter
#[inline]
pub fn record_image_accepted() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("tessera.datastore.images_total").increment(1);
    }
}

/// Record a mutation rejected by a frozen datastore.
///
/// - `tessera.datastore.frozen_rejections_total` – counter
#[inline]
pub fn record_frozen_rejection() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("tessera.datastore.frozen_rejections_total").increment(1);
    }
}

/// Record a save operation.
///
/// - `tessera.save.total` – counter with `outcome` label
/// - `tessera.save.duration_seconds` – histogram
/// - `tessera.save.images_written_total` – counter
#[inline]
pub fn record_save(duration: std::time::Duration, images: usize, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("tessera.save.total", "outcome" => outcome).increment(1);
        metrics::histogram!("tessera.save.duration_seconds").record(duration.as_secs_f64());
        metrics::counter!("tessera.save.images_written_total").increment(images as u64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, images, success);
    }
}

/// Record a listener that failed to handle an event.
///
/// - `tessera.bus.listener_failures_total` – counter
#[inline]
pub fn record_listener_failure() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("tessera.bus.listener_failures_total").increment(1);
    }
}
