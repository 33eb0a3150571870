//! Domain models for task review.
//!
//! - `TaskId` / `ResourceKey`: what is reviewed and what it contends on
//! - `ArtifactSet`: the task files a check reads
//! - `DispatchOutcome`, `CheckResult`, `ResultBundle`: what checks produce

pub mod artifact;
pub mod result;
pub mod task;
pub mod verdict;

pub use artifact::{ArtifactField, ArtifactSet, RubricCategory};
pub use result::{
    CheckKind, CheckResult, DispatchOutcome, ResultBundle, RubricResult, CANCELLED_TEXT,
};
pub use task::{ResourceKey, TaskId, TaskState};
pub use verdict::{
    classify_response, clean_json_response, parse_rubric_verdicts, CheckStatus, RubricVerdict,
};
