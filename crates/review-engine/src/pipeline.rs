//! Multi-task composition in two phases.
//!
//! Phase one prepares every task concurrently, serialized per owner by the
//! lock registry. Phase two runs every ready task's checks concurrently,
//! all competing for the one gate. Slow git work in phase one therefore never
//! sits on permits meant for remote calls.

use std::sync::Arc;

use futures::future::join_all;
use review_core::{obs, ResultBundle, TaskId};
use tracing::{info, Instrument};

use crate::progress::{ProgressSink, ProgressTracker};
use crate::runner::TaskRunner;

pub struct BatchPipeline {
    runner: TaskRunner,
}

impl BatchPipeline {
    pub fn new(runner: TaskRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// One bundle per input task, in input order.
    pub async fn run(&self, tasks: &[TaskId], sink: Arc<dyn ProgressSink>) -> Vec<ResultBundle> {
        let span = obs::run_span(&self.runner.state().run_id);
        self.run_phases(tasks, sink).instrument(span).await
    }

    async fn run_phases(&self, tasks: &[TaskId], sink: Arc<dyn ProgressSink>) -> Vec<ResultBundle> {
        let state = self.runner.state();
        obs::emit_run_started(&state.run_id, tasks.len());

        info!(tasks = tasks.len(), "preparing tasks");
        let prepared = join_all(tasks.iter().map(|task| self.runner.prepare(task))).await;

        let total: usize = prepared
            .iter()
            .filter_map(|p| p.as_ref().ok())
            .map(|p| p.checks.len())
            .sum();
        info!(checks = total, "running checks");

        let progress = ProgressTracker::begin(total, sink);
        let runner = &self.runner;
        let progress_ref = &progress;
        let bundles = join_all(tasks.iter().zip(prepared).map(|(task, slot)| async move {
            match slot {
                Ok(prepared) => runner.execute(prepared, progress_ref).await,
                Err(e) => ResultBundle::failed(task.clone(), e),
            }
        }))
        .await;
        progress.finish();

        let failed = bundles.iter().filter(|b| b.is_failed()).count();
        obs::emit_run_finished(&state.run_id, state.elapsed_ms(), total, failed);
        bundles
    }
}
