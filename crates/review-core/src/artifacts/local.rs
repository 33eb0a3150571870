//! Read-only artifact source over an existing directory of task folders.

use std::path::PathBuf;

use crate::domain::{ArtifactSet, TaskId};
use crate::error::ArtifactError;

use super::{read_task_files, ArtifactSource};

/// Reads `<root>/<folder>` directly, without any git step.
#[derive(Debug, Clone)]
pub struct LocalArtifactSource {
    root: PathBuf,
}

impl LocalArtifactSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl ArtifactSource for LocalArtifactSource {
    async fn fetch(&self, task: &TaskId) -> Result<ArtifactSet, ArtifactError> {
        read_task_files(&self.root.join(&task.folder)).await
    }
}
