//! Global atomic counters for monitor observability.
//!
//! Counters are incremented silently at the call site. The scheduler calls
//! [`Metrics::flush`] after every pass to emit the current values as one
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    passes_completed: AtomicU64,
    passes_failed: AtomicU64,
    dimensions_failed: AtomicU64,
    throttle_waits: AtomicU64,
    notifications_sent: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            passes_completed: AtomicU64::new(0),
            passes_failed: AtomicU64::new(0),
            dimensions_failed: AtomicU64::new(0),
            throttle_waits: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
        }
    }

    pub fn inc_passes_completed(&self) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "passes_completed", "counter incremented");
    }

    pub fn inc_passes_failed(&self) {
        self.passes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "passes_failed", "counter incremented");
    }

    pub fn inc_dimensions_failed(&self) {
        self.dimensions_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "dimensions_failed", "counter incremented");
    }

    pub fn inc_throttle_waits(&self) {
        self.throttle_waits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "throttle_waits", "counter incremented");
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "notifications_sent", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            passes_completed = self.passes_completed(),
            passes_failed = self.passes_failed(),
            dimensions_failed = self.dimensions_failed(),
            throttle_waits = self.throttle_waits(),
            notifications_sent = self.notifications_sent(),
        );
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes_completed.load(Ordering::Relaxed)
    }

    pub fn passes_failed(&self) -> u64 {
        self.passes_failed.load(Ordering::Relaxed)
    }

    pub fn dimensions_failed(&self) -> u64 {
        self.dimensions_failed.load(Ordering::Relaxed)
    }

    pub fn throttle_waits(&self) -> u64 {
        self.throttle_waits.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.passes_completed.store(0, Ordering::Relaxed);
        self.passes_failed.store(0, Ordering::Relaxed);
        self.dimensions_failed.store(0, Ordering::Relaxed);
        self.throttle_waits.store(0, Ordering::Relaxed);
        self.notifications_sent.store(0, Ordering::Relaxed);
    }
}
