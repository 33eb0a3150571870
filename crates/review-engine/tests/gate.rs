//! The global gate bounds in-flight requests across a whole run.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config, runner, FakeSource, ScriptedTransport};
use futures::future::join_all;
use review_core::{DispatchOutcome, TaskId};
use review_engine::{
    BatchPipeline, ConcurrencyGate, ProgressTracker, RecordingProgress, RequestDispatcher,
    RetryPolicy,
};
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn at_most_capacity_requests_in_flight() {
    let transport =
        Arc::new(ScriptedTransport::ok("PASS").with_latency(Duration::from_millis(200)));
    let gate = ConcurrencyGate::new(2);
    let dispatcher = RequestDispatcher::new(
        transport.clone(),
        gate.clone(),
        RetryPolicy::new(3, Duration::from_secs(120)),
        CancellationToken::new(),
    );

    let sink = Arc::new(RecordingProgress::new());
    let progress = ProgressTracker::begin(5, sink.clone());
    let labels: Vec<String> = (0..5).map(|i| format!("CHECK_{i}")).collect();
    let outcomes = join_all(
        labels
            .iter()
            .map(|label| dispatcher.execute(label, "instr", "input", Some(&progress))),
    )
    .await;
    progress.finish();

    assert!(outcomes.iter().all(DispatchOutcome::is_completed));
    assert_eq!(gate.peak(), 2);
    assert_eq!(gate.in_flight(), 0);
    assert!(transport.max_active() <= 2);
    assert!(sink.max_in_flight() <= 2);

    let finished = sink.finished().unwrap();
    assert_eq!((finished.done, finished.total, finished.in_flight), (5, 5, 0));
}

#[tokio::test(start_paused = true)]
async fn batch_shares_one_gate() {
    let transport =
        Arc::new(ScriptedTransport::ok("PASS").with_latency(Duration::from_millis(50)));
    let source = Arc::new(FakeSource::new(Duration::from_millis(10)));
    let cancel = CancellationToken::new();
    let pipeline = BatchPipeline::new(runner(
        &config(3, 3),
        transport.clone(),
        source,
        cancel,
    ));

    let tasks = vec![
        TaskId::new("alice", "v1", "t1"),
        TaskId::new("bob", "v1", "t2"),
        TaskId::new("carol", "v1", "t3"),
    ];
    let sink = Arc::new(RecordingProgress::new());
    let bundles = pipeline.run(&tasks, sink.clone()).await;

    assert_eq!(bundles.len(), 3);
    assert_eq!(transport.calls(), 3 * 14);
    assert!(transport.max_active() <= 3);
    assert_eq!(pipeline.runner().state().gate.peak(), 3);
    assert_eq!(sink.finished().unwrap().done, 3 * 14);
}
