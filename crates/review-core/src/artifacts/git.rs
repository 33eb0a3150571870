//! Git-backed artifact source.
//!
//! Each owner has one repository, `agentic-bench-<owner>`, cloned once into
//! the workspace directory. Fetching a task checks out the task's branch in
//! that shared clone and pulls, so two tasks of one owner must never fetch
//! concurrently. The engine serializes them by [`crate::domain::ResourceKey`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::info;

use crate::config::RunConfig;
use crate::domain::{ArtifactSet, TaskId};
use crate::error::ArtifactError;

use super::{read_task_files, ArtifactSource};

/// Directory under a repository that holds task folders.
pub const TASKS_SUBDIR: &str = "swebench/tasks";

#[derive(Debug, Clone)]
pub struct GitArtifactSource {
    repo_base_url: String,
    workspace_dir: PathBuf,
    git_timeout: Duration,
}

impl GitArtifactSource {
    pub fn new(
        repo_base_url: impl Into<String>,
        workspace_dir: impl Into<PathBuf>,
        git_timeout: Duration,
    ) -> Self {
        Self {
            repo_base_url: repo_base_url.into(),
            workspace_dir: workspace_dir.into(),
            git_timeout,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.repo_base_url.clone(),
            config.workspace_dir.clone(),
            config.git_timeout,
        )
    }

    pub fn repo_name(owner: &str) -> String {
        format!("agentic-bench-{owner}")
    }

    pub fn branch_name(version: &str) -> String {
        format!("agentic-bench-{}", version.to_lowercase())
    }

    pub fn repo_url(&self, owner: &str) -> String {
        format!(
            "{}/{}.git",
            self.repo_base_url.trim_end_matches('/'),
            Self::repo_name(owner)
        )
    }

    pub fn repo_path(&self, owner: &str) -> PathBuf {
        self.workspace_dir.join(Self::repo_name(owner))
    }

    /// Clone if absent, then check out the task branch and pull.
    pub async fn sync(&self, task: &TaskId) -> Result<PathBuf, ArtifactError> {
        let repo_path = self.repo_path(&task.owner);

        if !tokio::fs::try_exists(&repo_path).await? {
            tokio::fs::create_dir_all(&self.workspace_dir).await?;
            info!(owner = %task.owner, url = %self.repo_url(&task.owner), "cloning repository");
            let target = Self::repo_name(&task.owner);
            self.run_git(
                &["clone", &self.repo_url(&task.owner), &target],
                &self.workspace_dir,
            )
            .await?;
        }

        let branch = Self::branch_name(&task.version);
        info!(owner = %task.owner, branch = %branch, "checking out branch");
        self.run_git(&["checkout", &branch], &repo_path)
            .await
            .map_err(|e| match e {
                ArtifactError::Git(message) if is_unknown_ref(&message) => {
                    ArtifactError::BranchNotFound(branch.clone())
                }
                other => other,
            })?;
        self.run_git(&["pull"], &repo_path).await?;

        Ok(repo_path)
    }

    async fn run_git(&self, args: &[&str], cwd: &Path) -> Result<(), ArtifactError> {
        let child = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let command = args.first().copied().unwrap_or_default().to_string();
        let output = tokio::time::timeout(self.git_timeout, child.wait_with_output())
            .await
            .map_err(|_| ArtifactError::Timeout {
                command: command.clone(),
                secs: self.git_timeout.as_secs(),
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArtifactError::Git(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Whether git's stderr says the requested ref does not exist.
fn is_unknown_ref(stderr: &str) -> bool {
    stderr.contains("did not match any") || stderr.contains("invalid reference")
}

#[async_trait::async_trait]
impl ArtifactSource for GitArtifactSource {
    async fn fetch(&self, task: &TaskId) -> Result<ArtifactSet, ArtifactError> {
        let repo_path = self.sync(task).await?;
        read_task_files(&repo_path.join(TASKS_SUBDIR).join(&task.folder)).await
    }
}
