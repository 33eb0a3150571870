//! Single-task composition: prepare under the owner's lock, then run checks.

use std::sync::Arc;

use futures::future::join_all;
use review_core::artifacts::ArtifactSource;
use review_core::catalog::{CheckSet, PlannedCheck};
use review_core::{
    obs, validate_rubric, ArtifactError, ArtifactField, ResultBundle, SchemaReport, TaskId,
    TaskState,
};
use tracing::{debug, info, instrument};

use crate::progress::{ProgressSink, ProgressTracker};
use crate::state::RunState;

/// A task whose artifacts are loaded and whose checks are rendered.
#[derive(Debug, Clone)]
pub struct PreparedTask {
    pub task: TaskId,
    pub schema: SchemaReport,
    pub checks: Vec<PlannedCheck>,
}

fn advance(task: &TaskId, state: &mut TaskState, next: TaskState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal task transition {state:?} -> {next:?}"
    );
    debug!(owner = %task.owner, folder = %task.folder, from = ?state, to = ?next, "task state");
    *state = next;
}

/// Runs tasks against a shared [`RunState`].
#[derive(Clone)]
pub struct TaskRunner {
    state: Arc<RunState>,
    source: Arc<dyn ArtifactSource>,
    checks: Arc<CheckSet>,
}

impl TaskRunner {
    pub fn new(
        state: Arc<RunState>,
        source: Arc<dyn ArtifactSource>,
        checks: Arc<CheckSet>,
    ) -> Self {
        Self {
            state,
            source,
            checks,
        }
    }

    pub fn state(&self) -> &Arc<RunState> {
        &self.state
    }

    /// `PENDING -> PREPARING -> READY`, or `FAILED`.
    ///
    /// The owner's lock is held only around the fetch and released before
    /// this returns, so no check ever runs under it.
    #[instrument(skip(self), fields(owner = %task.owner, folder = %task.folder))]
    pub async fn prepare(&self, task: &TaskId) -> Result<PreparedTask, ArtifactError> {
        let mut lifecycle = TaskState::Pending;
        advance(task, &mut lifecycle, TaskState::Preparing);

        let fetched = self.fetch_locked(task).await;
        let artifacts = match fetched {
            Ok(artifacts) => artifacts,
            Err(e) => {
                advance(task, &mut lifecycle, TaskState::Failed);
                obs::emit_task_prepare_failed(&task.owner, &task.folder, &e);
                return Err(e);
            }
        };

        let schema = validate_rubric(artifacts.text(ArtifactField::RubricJson));
        let checks = self.checks.plan(&artifacts);
        advance(task, &mut lifecycle, TaskState::Ready);
        obs::emit_task_prepared(&task.owner, &task.folder, checks.len());

        Ok(PreparedTask {
            task: task.clone(),
            schema,
            checks,
        })
    }

    async fn fetch_locked(
        &self,
        task: &TaskId,
    ) -> Result<review_core::ArtifactSet, ArtifactError> {
        let cancel = &self.state.cancel;
        let _guard = self
            .state
            .locks
            .acquire(&task.resource_key(), cancel)
            .await
            .map_err(|_| ArtifactError::Cancelled)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ArtifactError::Cancelled),
            fetched = self.source.fetch(task) => fetched,
        }
    }

    /// `READY -> RUNNING -> DONE`.
    ///
    /// Every planned check yields exactly one result, in plan order, whatever
    /// order the requests complete in.
    #[instrument(skip_all, fields(owner = %prepared.task.owner, folder = %prepared.task.folder))]
    pub async fn execute(&self, prepared: PreparedTask, progress: &ProgressTracker) -> ResultBundle {
        let PreparedTask {
            task,
            schema,
            checks,
        } = prepared;
        let mut lifecycle = TaskState::Ready;
        advance(&task, &mut lifecycle, TaskState::Running);

        let dispatcher = &self.state.dispatcher;
        let results = join_all(checks.into_iter().map(|check| async move {
            let outcome = dispatcher
                .execute(&check.name, check.instruction, &check.input, Some(progress))
                .await;
            (check.name, check.kind, outcome)
        }))
        .await;

        advance(&task, &mut lifecycle, TaskState::Done);
        info!(checks = results.len(), "task checks finished");
        ResultBundle::assemble(task, schema, results)
    }

    /// Prepare and execute one task with its own progress display.
    pub async fn run(&self, task: &TaskId, sink: Arc<dyn ProgressSink>) -> ResultBundle {
        match self.prepare(task).await {
            Ok(prepared) => {
                let progress = ProgressTracker::begin(prepared.checks.len(), sink);
                let bundle = self.execute(prepared, &progress).await;
                progress.finish();
                bundle
            }
            Err(e) => ResultBundle::failed(task.clone(), e),
        }
    }
}
