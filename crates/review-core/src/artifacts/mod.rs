//! Artifact sources: where a task's files come from.
//!
//! [`ArtifactSource`] is the port the engine's preparation step calls. The
//! git-backed source mutates a shared checkout and is therefore run under the
//! owner's resource lock; the local source is read-only.

pub mod git;
pub mod local;

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{ArtifactField, ArtifactSet, TaskId};
use crate::error::ArtifactError;

pub use git::GitArtifactSource;
pub use local::LocalArtifactSource;

/// Fetches the artifact set for one task.
///
/// Inject a git-backed source in production, or a stub for tests.
#[async_trait::async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Produce the task's artifact set.
    ///
    /// Fails with [`ArtifactError::BranchNotFound`] or
    /// [`ArtifactError::NotFound`] when the branch or folder does not exist.
    /// Any failure is fatal to this task only.
    async fn fetch(&self, task: &TaskId) -> Result<ArtifactSet, ArtifactError>;
}

/// Read the task files from a task directory.
///
/// A missing directory is an error; a missing file becomes an empty string
/// and a warning.
pub async fn read_task_files(dir: &Path) -> Result<ArtifactSet, ArtifactError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(ArtifactError::NotFound(dir.display().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ArtifactError::NotFound(dir.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    let mut files = BTreeMap::new();
    for (field, rel_path) in ArtifactField::FILES {
        let path = dir.join(rel_path);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(file = %rel_path, dir = %dir.display(), "task file not found");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        files.insert(field.key().to_string(), text);
    }

    debug!(dir = %dir.display(), "read task files");
    Ok(ArtifactSet::from_files(files))
}
