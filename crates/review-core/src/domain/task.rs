//! Task identity, resource keys and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one unit of review work.
///
/// `owner` selects the artifact source (one repository per owner), `version`
/// selects the branch within it and `folder` the task directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    pub owner: String,
    pub version: String,
    pub folder: String,
}

impl TaskId {
    pub fn new(
        owner: impl Into<String>,
        version: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            version: version.into(),
            folder: folder.into(),
        }
    }

    /// The key under which this task's local mutations serialize.
    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey(self.owner.clone())
    }

    /// File-name stem used for this task's reports.
    pub fn report_stem(&self) -> String {
        format!("{}_{}", self.owner, self.folder)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.owner, self.folder)
    }
}

/// Grouping key for tasks that share mutable local state.
///
/// Many tasks can map to one key; tasks with equal keys never run their
/// preparation concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey(pub String);

impl ResourceKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a task inside a run.
///
/// `Pending -> Preparing -> Ready -> Running -> Done`, with `Failed` reachable
/// only from `Preparing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Preparing,
    Ready,
    Running,
    Done,
    Failed,
}

impl TaskState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Preparing)
                | (TaskState::Preparing, TaskState::Ready)
                | (TaskState::Preparing, TaskState::Failed)
                | (TaskState::Ready, TaskState::Running)
                | (TaskState::Running, TaskState::Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}
