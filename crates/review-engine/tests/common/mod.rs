//! Shared fakes for engine integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use review_core::artifacts::ArtifactSource;
use review_core::{ApiKey, ArtifactError, ArtifactSet, CheckSet, RunConfig, TaskId};
use review_engine::{
    InferenceTransport, RunState, TaskRunner, TransportError, TransportResponse,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Responder = dyn Fn(usize, &str) -> Result<TransportResponse, TransportError> + Send + Sync;

/// A generateContent body carrying `text`.
pub fn gemini_body(text: &str) -> String {
    serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
}

/// Transport whose answers come from a closure over (call index, input).
pub struct ScriptedTransport {
    respond: Box<Responder>,
    latency: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new(
        respond: impl Fn(usize, &str) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub fn status(status: u16, body: &'static str) -> Self {
        Self::new(move |_, _| Ok(TransportResponse::new(status, body)))
    }

    pub fn ok(text: &'static str) -> Self {
        Self::new(move |_, _| Ok(TransportResponse::new(200, gemini_body(text))))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl InferenceTransport for ScriptedTransport {
    async fn send(
        &self,
        _instruction: &str,
        input: &str,
    ) -> Result<TransportResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(n, input)
    }
}

/// Start and end of one fetch, for overlap assertions.
#[derive(Debug, Clone)]
pub struct FetchInterval {
    pub owner: String,
    pub folder: String,
    pub start: Instant,
    pub end: Instant,
}

impl FetchInterval {
    pub fn overlaps(&self, other: &FetchInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Artifact source that sleeps, records its interval, and fails on demand.
pub struct FakeSource {
    latency: Duration,
    rubric: String,
    failing_folders: HashSet<String>,
    intervals: Mutex<Vec<FetchInterval>>,
}

impl FakeSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            rubric: String::new(),
            failing_folders: HashSet::new(),
            intervals: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rubric(mut self, rubric: &str) -> Self {
        self.rubric = rubric.to_string();
        self
    }

    pub fn failing(mut self, folder: &str) -> Self {
        self.failing_folders.insert(folder.to_string());
        self
    }

    pub fn intervals(&self) -> Vec<FetchInterval> {
        self.intervals.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ArtifactSource for FakeSource {
    async fn fetch(&self, task: &TaskId) -> Result<ArtifactSet, ArtifactError> {
        let start = Instant::now();
        tokio::time::sleep(self.latency).await;
        self.intervals.lock().unwrap().push(FetchInterval {
            owner: task.owner.clone(),
            folder: task.folder.clone(),
            start,
            end: Instant::now(),
        });

        if self.failing_folders.contains(&task.folder) {
            return Err(ArtifactError::NotFound(task.folder.clone()));
        }

        let mut files = BTreeMap::new();
        files.insert("rubric_json".to_string(), self.rubric.clone());
        files.insert("test_patch".to_string(), format!("+ test for {}", task.folder));
        files.insert("interface_md".to_string(), "pub fn run()".to_string());
        Ok(ArtifactSet::from_files(files))
    }
}

pub fn config(max_concurrency: usize, max_retries: u32) -> RunConfig {
    RunConfig::new(ApiKey::new("test-key"))
        .with_max_concurrency(max_concurrency)
        .with_max_retries(max_retries)
}

pub fn runner(
    config: &RunConfig,
    transport: Arc<ScriptedTransport>,
    source: Arc<FakeSource>,
    cancel: CancellationToken,
) -> TaskRunner {
    let state = Arc::new(RunState::new(config, transport, cancel));
    TaskRunner::new(state, source, Arc::new(CheckSet::standard()))
}
