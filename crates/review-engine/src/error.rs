//! Engine-level errors.
//!
//! Request failures are not represented here; the dispatcher folds them into
//! [`review_core::DispatchOutcome`] values.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The run's cancellation token fired while waiting.
    #[error("run cancelled")]
    Cancelled,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
