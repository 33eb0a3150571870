//! Retry, backoff and gating behaviour of the request dispatcher.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{gemini_body, ScriptedTransport};
use review_core::DispatchOutcome;
use review_engine::{
    ConcurrencyGate, ProgressTracker, RecordingProgress, RequestDispatcher, RetryPolicy,
    TransportError, TransportResponse, NO_CONTENT_TEXT,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const SLACK: Duration = Duration::from_millis(10);

fn dispatcher(
    transport: Arc<ScriptedTransport>,
    gate: ConcurrencyGate,
    max_attempts: u32,
    cancel: CancellationToken,
) -> RequestDispatcher {
    RequestDispatcher::new(
        transport,
        gate,
        RetryPolicy::new(max_attempts, Duration::from_secs(120)),
        cancel,
    )
}

fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + SLACK,
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn retryable_status_uses_full_budget_with_backoff() {
    let transport = Arc::new(ScriptedTransport::new(|n, _| {
        Ok(TransportResponse::new(503, format!("overloaded #{}", n + 1)))
    }));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, CancellationToken::new());

    let started = Instant::now();
    let outcome = d.execute("CHECK", "instr", "input", None).await;
    let elapsed = started.elapsed();

    assert_eq!(
        outcome,
        DispatchOutcome::RemoteError("Error 503: overloaded #3".to_string())
    );
    assert_eq!(transport.calls(), 3);

    let times = transport.call_times();
    assert_close(times[1] - times[0], Duration::from_secs(1));
    assert_close(times[2] - times[1], Duration::from_millis(2500));
    // No sleep after the final attempt.
    assert_close(elapsed, Duration::from_millis(3500));
}

#[tokio::test(start_paused = true)]
async fn fatal_status_is_attempted_once() {
    let transport = Arc::new(ScriptedTransport::status(404, "not found"));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, CancellationToken::new());

    let outcome = d.execute("CHECK", "instr", "input", None).await;

    assert_eq!(
        outcome,
        DispatchOutcome::RemoteError("Error 404: not found".to_string())
    );
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_success_is_terminal() {
    let transport = Arc::new(ScriptedTransport::status(200, r#"{"candidates": []}"#));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, CancellationToken::new());

    let outcome = d.execute("CHECK", "instr", "input", None).await;

    assert_eq!(outcome, DispatchOutcome::RemoteError(NO_CONTENT_TEXT.to_string()));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_then_success() {
    let transport = Arc::new(ScriptedTransport::new(|n, _| match n {
        0 => Ok(TransportResponse::new(429, "slow down")),
        1 => Err(TransportError::Connection("connection reset".into())),
        _ => Ok(TransportResponse::new(200, gemini_body("**PASS**"))),
    }));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, CancellationToken::new());

    let outcome = d.execute("CHECK", "instr", "input", None).await;

    assert_eq!(outcome, DispatchOutcome::Completed("**PASS**".to_string()));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn attempt_timeout_is_retried() {
    let transport = Arc::new(ScriptedTransport::ok("late").with_latency(Duration::from_secs(3600)));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 2, CancellationToken::new());

    let outcome = d.execute("CHECK", "instr", "input", None).await;

    assert_eq!(
        outcome,
        DispatchOutcome::RemoteError("Error: Request timed out.".to_string())
    );
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_transport_error_stops() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        Err(TransportError::Other("builder error".into()))
    }));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, CancellationToken::new());

    let outcome = d.execute("CHECK", "instr", "input", None).await;

    assert_eq!(
        outcome,
        DispatchOutcome::RemoteError("Request Failed: builder error".to_string())
    );
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn backoff_does_not_hold_a_permit() {
    let gate = ConcurrencyGate::new(1);
    let cancel = CancellationToken::new();

    let failing = Arc::new(
        ScriptedTransport::status(503, "busy").with_latency(Duration::from_millis(100)),
    );
    let healthy = Arc::new(ScriptedTransport::ok("PASS"));
    let a = dispatcher(failing.clone(), gate.clone(), 2, cancel.clone());
    let b = dispatcher(healthy.clone(), gate.clone(), 2, cancel.clone());

    let started = Instant::now();
    let (first, second) = tokio::join!(
        a.execute("A", "instr", "input", None),
        async {
            tokio::task::yield_now().await;
            b.execute("B", "instr", "input", None).await
        }
    );

    assert!(matches!(first, DispatchOutcome::RemoteError(_)));
    assert_eq!(second, DispatchOutcome::Completed("PASS".to_string()));

    // B ran during A's one-second backoff, not after A's retry.
    let b_start = healthy.call_times()[0] - started;
    assert!(b_start < Duration::from_secs(1), "B started at {b_start:?}");
    assert_eq!(gate.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff() {
    let transport = Arc::new(ScriptedTransport::status(503, "busy"));
    let cancel = CancellationToken::new();
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let sink = Arc::new(RecordingProgress::new());
    let progress = ProgressTracker::begin(1, sink.clone());
    let outcome = d.execute("CHECK", "instr", "input", Some(&progress)).await;

    assert_eq!(outcome, DispatchOutcome::Cancelled);
    assert_eq!(transport.calls(), 1);
    let snapshot = progress.snapshot();
    assert_eq!(snapshot.done, 1);
    assert_eq!(snapshot.in_flight, 0);
}

#[tokio::test(start_paused = true)]
async fn progress_counts_each_check_once_across_retries() {
    let transport = Arc::new(ScriptedTransport::status(500, "oops"));
    let d = dispatcher(transport.clone(), ConcurrencyGate::new(4), 3, CancellationToken::new());

    let sink = Arc::new(RecordingProgress::new());
    let progress = ProgressTracker::begin(1, sink.clone());
    d.execute("CHECK", "instr", "input", Some(&progress)).await;
    progress.finish();

    let finished = sink.finished().unwrap();
    assert_eq!(finished.done, 1);
    assert_eq!(finished.in_flight, 0);
    let starts = sink.frames().iter().filter(|(_, l)| l == "+CHECK").count();
    assert_eq!(starts, 3);
}
