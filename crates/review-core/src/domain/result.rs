//! Check outcomes and the per-task result bundle.

use std::fmt;

use serde::Serialize;

use super::artifact::RubricCategory;
use super::task::TaskId;
use super::verdict::{classify_response, parse_rubric_verdicts, CheckStatus, RubricVerdict};
use crate::schema::SchemaReport;

/// Text used in place of a response for checks that never completed.
pub const CANCELLED_TEXT: &str = "Error: Run cancelled.";

/// What one analysis request produced.
///
/// Every variant carries displayable text, so a failed request still occupies
/// its slot in the report instead of aborting its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The service answered with content.
    Completed(String),
    /// Terminal failure: fatal status, malformed response or exhausted retries.
    RemoteError(String),
    /// The run was cancelled before this request finished.
    Cancelled,
}

impl DispatchOutcome {
    /// Text shown for this outcome in reports.
    pub fn text(&self) -> &str {
        match self {
            DispatchOutcome::Completed(text) | DispatchOutcome::RemoteError(text) => text,
            DispatchOutcome::Cancelled => CANCELLED_TEXT,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed(_))
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Which section of the bundle a check reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "category", rename_all = "snake_case")]
pub enum CheckKind {
    Fairness,
    Rubric(RubricCategory),
}

/// Result of one (task, check) pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub kind: CheckKind,
    pub outcome: DispatchOutcome,
    pub status: CheckStatus,
}

impl CheckResult {
    /// A fairness check result; status comes from the first-line classifier.
    pub fn fairness(name: impl Into<String>, outcome: DispatchOutcome) -> Self {
        let status = match &outcome {
            DispatchOutcome::Completed(text) => classify_response(text),
            _ => CheckStatus::Unknown,
        };
        Self {
            name: name.into(),
            kind: CheckKind::Fairness,
            outcome,
            status,
        }
    }

    /// Raw response text, or the error text in its place.
    pub fn raw_text(&self) -> &str {
        self.outcome.text()
    }
}

/// Result of a rubric-category check with its parsed sub-item verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricResult {
    pub category: RubricCategory,
    pub check: CheckResult,
    /// Parsed verdicts, or the parse error shown next to the raw output.
    pub verdicts: Result<Vec<RubricVerdict>, String>,
}

impl RubricResult {
    pub fn new(category: RubricCategory, name: impl Into<String>, outcome: DispatchOutcome) -> Self {
        let verdicts = parse_rubric_verdicts(outcome.text());
        let status = match (&outcome, &verdicts) {
            (DispatchOutcome::Completed(_), Ok(items)) if !items.is_empty() => {
                if items.iter().all(RubricVerdict::passed) {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Fail
                }
            }
            _ => CheckStatus::Unknown,
        };
        Self {
            category,
            check: CheckResult {
                name: name.into(),
                kind: CheckKind::Rubric(category),
                outcome,
                status,
            },
            verdicts,
        }
    }

    /// `(passed, total)` sub-item counts, when the response parsed.
    pub fn pass_count(&self) -> Option<(usize, usize)> {
        self.verdicts.as_ref().ok().map(|items| {
            let passed = items.iter().filter(|v| v.passed()).count();
            (passed, items.len())
        })
    }
}

/// Everything one task produced, ready for the report assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    pub task: TaskId,
    pub schema: Option<SchemaReport>,
    pub fairness: Vec<CheckResult>,
    pub rubric: Vec<RubricResult>,
    /// Set when artifact preparation failed; no checks ran in that case.
    pub preparation_error: Option<String>,
}

impl ResultBundle {
    /// Partition executed checks into the fairness and rubric sections,
    /// preserving the order they are given in.
    pub fn assemble(
        task: TaskId,
        schema: SchemaReport,
        results: Vec<(String, CheckKind, DispatchOutcome)>,
    ) -> Self {
        let mut fairness = Vec::new();
        let mut rubric = Vec::new();
        for (name, kind, outcome) in results {
            match kind {
                CheckKind::Fairness => fairness.push(CheckResult::fairness(name, outcome)),
                CheckKind::Rubric(category) => {
                    rubric.push(RubricResult::new(category, name, outcome))
                }
            }
        }
        Self {
            task,
            schema: Some(schema),
            fairness,
            rubric,
            preparation_error: None,
        }
    }

    /// A bundle for a task whose preparation failed.
    pub fn failed(task: TaskId, error: impl fmt::Display) -> Self {
        Self {
            task,
            schema: None,
            fairness: Vec::new(),
            rubric: Vec::new(),
            preparation_error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.preparation_error.is_some()
    }

    /// Number of checks represented in this bundle.
    pub fn check_count(&self) -> usize {
        self.fairness.len() + self.rubric.len()
    }

    /// Check names in presentation order.
    pub fn check_names(&self) -> Vec<&str> {
        self.fairness
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.rubric.iter().map(|r| r.check.name.as_str()))
            .collect()
    }
}
