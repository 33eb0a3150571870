//! Process-wide state scoped to one invocation.

use std::sync::Arc;
use std::time::Instant;

use review_core::RunConfig;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{RequestDispatcher, RetryPolicy};
use crate::gate::ConcurrencyGate;
use crate::locks::ResourceLockRegistry;
use crate::transport::InferenceTransport;

/// Shared handles for one run: the gate, the lock registry, the dispatcher
/// built on the gate, and the cancellation token that reaches all of them.
///
/// Built at run start and dropped at run end; nothing is persisted.
pub struct RunState {
    pub run_id: String,
    pub started_at: Instant,
    pub gate: ConcurrencyGate,
    pub locks: ResourceLockRegistry,
    pub dispatcher: RequestDispatcher,
    pub cancel: CancellationToken,
}

impl RunState {
    pub fn new(
        config: &RunConfig,
        transport: Arc<dyn InferenceTransport>,
        cancel: CancellationToken,
    ) -> Self {
        let gate = ConcurrencyGate::new(config.max_concurrency);
        let policy = RetryPolicy::new(config.max_retries, config.request_timeout);
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Instant::now(),
            dispatcher: RequestDispatcher::new(transport, gate.clone(), policy, cancel.clone()),
            gate,
            locks: ResourceLockRegistry::new(),
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}
