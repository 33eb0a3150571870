//! Task Review Core Library
//!
//! Domain model, check catalog, artifact sources, rubric validation and
//! report assembly. The concurrent execution engine lives in `review-engine`.

pub mod artifacts;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod obs;
pub mod report;
pub mod schema;
pub mod telemetry;

pub use artifacts::{read_task_files, ArtifactSource, GitArtifactSource, LocalArtifactSource};
pub use batch::{load_batch, parse_batch};
pub use catalog::{CategoryCheck, CheckSet, CheckSpec, PlannedCheck};
pub use config::{ApiKey, RunConfig};
pub use domain::{
    ArtifactField, ArtifactSet, CheckKind, CheckResult, CheckStatus, DispatchOutcome,
    ResourceKey, ResultBundle, RubricCategory, RubricResult, RubricVerdict, TaskId, TaskState,
};
pub use error::{ArtifactError, BatchInputError, ConfigError, Result, ReviewError};
pub use report::{render_html_report, render_summary, write_report, WrittenReport};
pub use schema::{validate_rubric, SchemaReport};
