//! Structured lifecycle events for monitoring passes.
//!
//! Every pass runs inside an `asm.pass` span carrying a fresh pass id and
//! the resource identity; the functions below emit the key transitions.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Dimension, ResourceIdentity};
use crate::scheduler::LoopState;

/// Span for one monitoring pass of one resource.
///
/// Attach with `tracing::Instrument` so it survives `.await` points.
pub fn pass_span(resource: &ResourceIdentity) -> tracing::Span {
    let pass_id = Uuid::new_v4();
    tracing::info_span!("asm.pass", pass_id = %pass_id, resource = %resource)
}

pub fn emit_pass_started(resource: &ResourceIdentity) {
    info!(event = "pass.started", resource = %resource);
}

pub fn emit_pass_finished(resource: &ResourceIdentity, new_items: usize, failed_dimensions: usize) {
    info!(
        event = "pass.finished",
        resource = %resource,
        new_items = new_items,
        failed_dimensions = failed_dimensions,
    );
}

pub fn emit_loop_state(state: LoopState) {
    tracing::debug!(event = "loop.state", state = %state);
}

/// A monitor is about to diff one dimension's snapshot against its baseline.
pub fn emit_diffing(resource: &ResourceIdentity, dimension: Dimension) {
    tracing::debug!(
        event = "loop.state",
        state = %LoopState::Diffing,
        dimension = %dimension,
        resource = %resource,
    );
}

pub fn emit_bootstrap(resource: &ResourceIdentity, dimension: Dimension, observed: usize) {
    info!(
        event = "dimension.bootstrap",
        resource = %resource,
        dimension = %dimension,
        observed = observed,
    );
}

/// The stored marker was not in the fetched window; everything fetched is
/// being reported as new.
pub fn emit_window_exceeded(resource: &ResourceIdentity, dimension: Dimension, reported: usize) {
    warn!(
        event = "dimension.window_exceeded",
        resource = %resource,
        dimension = %dimension,
        reported = reported,
    );
}

pub fn emit_dimension_failed(
    resource: &ResourceIdentity,
    dimension: Dimension,
    error: &dyn std::fmt::Display,
) {
    warn!(event = "dimension.failed", resource = %resource, dimension = %dimension, error = %error);
}

pub fn emit_baseline_degraded(resource: &ResourceIdentity, error: &dyn std::fmt::Display) {
    warn!(event = "baseline.degraded", resource = %resource, error = %error);
}
