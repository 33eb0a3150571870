//! Structured observability hooks for review run lifecycle events.
//!
//! - A run-scoped tracing span from [`run_span`]
//! - Emission functions for key lifecycle events: run start and finish, task
//!   preparation, and failed request attempts
//!
//! Events are emitted at `info!` level unless noted; filter with `RUST_LOG`.

use tracing::{info, warn};

/// Span that tags every event of a run with its id.
///
/// Attach it to the run future with `tracing::Instrument`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("review.run", run_id = %run_id)
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, tasks: usize) {
    info!(event = "run.started", run_id = %run_id, tasks = tasks);
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, checks: usize, failed_tasks: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        checks = checks,
        failed_tasks = failed_tasks,
    );
}

/// Emit event: a task's artifacts are ready.
pub fn emit_task_prepared(owner: &str, folder: &str, planned_checks: usize) {
    info!(
        event = "task.prepared",
        owner = %owner,
        folder = %folder,
        planned_checks = planned_checks,
    );
}

/// Emit event: a task's preparation failed (warning level).
pub fn emit_task_prepare_failed(owner: &str, folder: &str, error: &dyn std::fmt::Display) {
    warn!(event = "task.prepare_failed", owner = %owner, folder = %folder, error = %error);
}

/// Emit event: one request attempt failed (warning level).
pub fn emit_attempt_failed(attempt: u32, max_attempts: u32, retryable: bool, error: &str) {
    warn!(
        event = "check.attempt_failed",
        attempt = attempt,
        max_attempts = max_attempts,
        retryable = retryable,
        error = %error,
    );
}
