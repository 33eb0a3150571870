//! Task Review CLI
//!
//! The `task-review` command validates task artifacts against the check
//! catalog and writes one report per task.
//!
//! ## Modes
//!
//! - single task: `--user-code --task-code --folder`
//! - batch: `--batch <csv>` with a `user_code,task_code,folder` header

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use review_core::artifacts::ArtifactSource;
use review_core::telemetry::init_tracing;
use review_core::{
    load_batch, render_summary, write_report, ApiKey, CheckSet, GitArtifactSource,
    LocalArtifactSource, ResultBundle, RunConfig, TaskId,
};
use review_engine::{
    BatchPipeline, GeminiTransport, RunState, TaskRunner, TerminalProgress,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "task-review")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate task artifacts with a remote model", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["folder", "batch"])))]
struct Cli {
    /// Task owner (selects the task repository)
    #[arg(long, requires_all = ["task_code", "folder"])]
    user_code: Option<String>,

    /// Task version (selects the branch)
    #[arg(long, requires_all = ["user_code", "folder"])]
    task_code: Option<String>,

    /// Task folder inside the repository
    #[arg(long, requires_all = ["user_code", "task_code"])]
    folder: Option<String>,

    /// CSV file listing many tasks
    #[arg(long, conflicts_with_all = ["user_code", "task_code", "folder"])]
    batch: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(long, default_value = "./reports")]
    output_dir: PathBuf,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Global cap on in-flight analysis requests
    #[arg(long, default_value_t = 50)]
    max_concurrency: usize,

    /// Attempts per analysis request, first try included
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Per-attempt timeout in seconds
    #[arg(long, default_value_t = 120)]
    request_timeout: u64,

    /// Directory holding cloned task repositories
    #[arg(long, default_value = ".")]
    workspace_dir: PathBuf,

    /// Read task folders from this directory instead of git
    #[arg(long)]
    tasks_root: Option<PathBuf>,

    /// Also write a JSON bundle next to each HTML report
    #[arg(long)]
    emit_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// API credential
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(ApiKey::new(self.api_key.clone()))
            .with_max_concurrency(self.max_concurrency)
            .with_max_retries(self.max_retries)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_workspace_dir(&self.workspace_dir)
            .with_output_dir(&self.output_dir);
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        config
    }

    /// The single task named on the command line, if any.
    fn single_task(&self) -> Option<TaskId> {
        match (&self.user_code, &self.task_code, &self.folder) {
            (Some(owner), Some(version), Some(folder)) => {
                Some(TaskId::new(owner, version, folder))
            }
            _ => None,
        }
    }

    async fn tasks(&self) -> Result<Vec<TaskId>> {
        if let Some(task) = self.single_task() {
            return Ok(vec![task]);
        }
        let Some(path) = &self.batch else {
            bail!("either --batch or --user-code/--task-code/--folder is required");
        };
        let tasks = load_batch(path)
            .await
            .with_context(|| format!("Failed to load batch file {}", path.display()))?;
        if tasks.is_empty() {
            bail!("batch file {} lists no tasks", path.display());
        }
        Ok(tasks)
    }

    fn artifact_source(&self, config: &RunConfig) -> Arc<dyn ArtifactSource> {
        match &self.tasks_root {
            Some(root) => Arc::new(LocalArtifactSource::new(root)),
            None => Arc::new(GitArtifactSource::from_config(config)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = cli.run_config();
    config.validate().context("Invalid configuration")?;
    let tasks = cli.tasks().await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
        });
    }

    let transport = GeminiTransport::new(&config).context("Failed to build HTTP client")?;
    let state = Arc::new(RunState::new(&config, Arc::new(transport), cancel.clone()));
    let runner = TaskRunner::new(
        state,
        cli.artifact_source(&config),
        Arc::new(CheckSet::standard()),
    );
    let pipeline = BatchPipeline::new(runner);

    info!(tasks = tasks.len(), model = %config.model, "starting review");
    let bundles = pipeline.run(&tasks, Arc::new(TerminalProgress)).await;

    let failed = publish(&bundles, &config, cli.emit_json)?;

    if cancel.is_cancelled() {
        bail!("run cancelled; partial reports written to {}", config.output_dir.display());
    }
    if failed > 0 {
        bail!("{failed} of {} task(s) could not be prepared", bundles.len());
    }
    Ok(())
}

/// Print each summary and write each report. Returns the number of failed
/// bundles.
fn publish(bundles: &[ResultBundle], config: &RunConfig, emit_json: bool) -> Result<usize> {
    let color = std::io::stdout().is_terminal();
    let mut failed = 0;

    for bundle in bundles {
        println!("{}", render_summary(bundle, color));
        let written = write_report(bundle, &config.output_dir, emit_json)
            .with_context(|| format!("Failed to write report for {}", bundle.task))?;
        println!("Report: {}", written.html.display());
        if let Some(json) = &written.json {
            println!("JSON:   {}", json.display());
        }
        if bundle.is_failed() {
            failed += 1;
        }
    }

    Ok(failed)
}
