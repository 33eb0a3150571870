//! Task Review Engine
//!
//! Concurrent check execution: a global request gate, a retrying dispatcher,
//! per-owner preparation locks, live progress, and the single-task and batch
//! compositions built from them.

pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod locks;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod state;
pub mod transport;

pub use dispatcher::{RequestDispatcher, RetryPolicy, NO_CONTENT_TEXT, RETRYABLE_STATUSES};
pub use error::{EngineError, EngineResult};
pub use gate::{ConcurrencyGate, GatePermit};
pub use locks::ResourceLockRegistry;
pub use pipeline::BatchPipeline;
pub use progress::{
    ProgressSink, ProgressSnapshot, ProgressTracker, RecordingProgress, TerminalProgress,
};
pub use runner::{PreparedTask, TaskRunner};
pub use state::RunState;
pub use transport::{
    generate_content_text, GeminiTransport, InferenceTransport, TransportError,
    TransportResponse,
};
