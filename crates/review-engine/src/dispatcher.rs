//! Request dispatch with retry, backoff and per-attempt gating.

use std::sync::Arc;
use std::time::Duration;

use review_core::obs;
use review_core::DispatchOutcome;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::gate::ConcurrencyGate;
use crate::progress::ProgressTracker;
use crate::transport::{InferenceTransport, TransportError};

/// HTTP statuses that are worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Text returned when a successful response carries no content.
pub const NO_CONTENT_TEXT: &str = "Error: No content generated.";

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    /// Wall-clock bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            attempt_timeout,
        }
    }

    /// Wait after the zero-based `attempt` failed: `2^attempt + attempt * 0.5` s.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(2f64.powi(attempt as i32) + f64::from(attempt) * 0.5)
    }

    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }
}

enum AttemptResult {
    Done(DispatchOutcome),
    Retry(String),
}

/// Issues analysis requests for every check of a run.
///
/// A permit is held for exactly one attempt; backoff sleeps run without one.
/// Nothing here returns `Err`: failures become [`DispatchOutcome`] values.
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn InferenceTransport>,
    gate: ConcurrencyGate,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RequestDispatcher {
    pub fn new(
        transport: Arc<dyn InferenceTransport>,
        gate: ConcurrencyGate,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            gate,
            policy,
            cancel,
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run one request to a terminal outcome.
    ///
    /// When `progress` is given, its in-flight count follows permit ownership
    /// and the check is counted done exactly once.
    #[instrument(skip_all, fields(check = %check))]
    pub async fn execute(
        &self,
        check: &str,
        instruction: &str,
        input: &str,
        progress: Option<&ProgressTracker>,
    ) -> DispatchOutcome {
        let max = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max {
            match self.attempt(check, instruction, input, progress).await {
                AttemptResult::Done(outcome) => {
                    if let DispatchOutcome::RemoteError(text) = &outcome {
                        obs::emit_attempt_failed(attempt + 1, max, false, text);
                    }
                    return outcome;
                }
                AttemptResult::Retry(error) => {
                    obs::emit_attempt_failed(attempt + 1, max, true, &error);
                    last_error = error;
                }
            }

            if attempt + 1 < max {
                let delay = self.policy.delay_for(attempt);
                debug!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        if let Some(p) = progress {
                            p.on_skip(check);
                        }
                        return DispatchOutcome::Cancelled;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        if let Some(p) = progress {
            p.on_skip(check);
        }
        DispatchOutcome::RemoteError(last_error)
    }

    /// One gated attempt. Progress is updated before the permit drops.
    async fn attempt(
        &self,
        check: &str,
        instruction: &str,
        input: &str,
        progress: Option<&ProgressTracker>,
    ) -> AttemptResult {
        let Ok(_permit) = self.gate.acquire(&self.cancel).await else {
            if let Some(p) = progress {
                p.on_skip(check);
            }
            return AttemptResult::Done(DispatchOutcome::Cancelled);
        };
        if let Some(p) = progress {
            p.on_start(check);
        }

        let result = self.send_once(instruction, input).await;
        if let Some(p) = progress {
            match &result {
                AttemptResult::Done(_) => p.on_finish(check),
                AttemptResult::Retry(_) => p.on_release(check),
            }
        }
        result
    }

    async fn send_once(&self, instruction: &str, input: &str) -> AttemptResult {
        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return AttemptResult::Done(DispatchOutcome::Cancelled),
            sent = tokio::time::timeout(
                self.policy.attempt_timeout,
                self.transport.send(instruction, input),
            ) => sent.unwrap_or(Err(TransportError::Timeout)),
        };

        match sent {
            Ok(response) if response.status == 200 => {
                AttemptResult::Done(match self.transport.extract_text(&response.body) {
                    Some(text) => DispatchOutcome::Completed(text),
                    None => DispatchOutcome::RemoteError(NO_CONTENT_TEXT.to_string()),
                })
            }
            Ok(response) => {
                let error = format!("Error {}: {}", response.status, response.body);
                if RetryPolicy::is_retryable_status(response.status) {
                    AttemptResult::Retry(error)
                } else {
                    AttemptResult::Done(DispatchOutcome::RemoteError(error))
                }
            }
            Err(e) if e.is_retryable() => AttemptResult::Retry(e.to_string()),
            Err(e) => AttemptResult::Done(DispatchOutcome::RemoteError(e.to_string())),
        }
    }
}
