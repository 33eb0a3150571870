//! Error taxonomy for task review.
//!
//! Remote analysis failures are not errors in this taxonomy: they travel as
//! [`crate::domain::DispatchOutcome`] values so one failing check can never
//! abort a sibling. The types here cover configuration, artifact preparation
//! and batch input.

/// Errors produced while fetching a task's artifact set.
///
/// Any of these is fatal to the owning task only.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("task folder not found: {0}")]
    NotFound(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("git {command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("preparation cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by [`crate::config::RunConfig::validate`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API credential is empty")]
    MissingCredential,

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("max_retries must be at least 1")]
    ZeroRetries,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Errors produced while parsing a batch input file.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchInputError {
    #[error("batch input is empty")]
    Empty,

    #[error("batch header is missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: field '{field}' is empty")]
    EmptyField { line: usize, field: &'static str },
}

/// Umbrella error for review operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("batch input error: {0}")]
    BatchInput(#[from] BatchInputError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for review operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
