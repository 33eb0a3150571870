//! Report assembly: HTML document, terminal summary and optional JSON bundle.
//!
//! Everything here is pure formatting except [`write_report`], which persists
//! one task's outputs under the configured output directory.

pub mod html;
pub mod summary;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ResultBundle;
use crate::error::Result;

pub use html::{escape_html, md_to_html, render_html_report};
pub use summary::render_summary;

/// Files written for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub html: PathBuf,
    pub json: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    bundle: &'a ResultBundle,
}

pub fn html_report_path(output_dir: &Path, bundle: &ResultBundle) -> PathBuf {
    output_dir.join(format!("{}_report.html", bundle.task.report_stem()))
}

pub fn json_report_path(output_dir: &Path, bundle: &ResultBundle) -> PathBuf {
    output_dir.join(format!("{}_report.json", bundle.task.report_stem()))
}

/// Write the HTML report, and the JSON bundle when `emit_json` is set.
pub fn write_report(
    bundle: &ResultBundle,
    output_dir: &Path,
    emit_json: bool,
) -> Result<WrittenReport> {
    std::fs::create_dir_all(output_dir)?;
    let generated_at = Utc::now();

    let html_path = html_report_path(output_dir, bundle);
    std::fs::write(&html_path, render_html_report(bundle, generated_at))?;

    let json = if emit_json {
        let path = json_report_path(output_dir, bundle);
        let content = serde_json::to_string_pretty(&JsonReport {
            generated_at,
            bundle,
        })?;
        std::fs::write(&path, content)?;
        Some(path)
    } else {
        None
    };

    Ok(WrittenReport {
        html: html_path,
        json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckKind, DispatchOutcome, TaskId};
    use crate::schema::SchemaReport;

    #[test]
    fn test_write_report_paths_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let bundle = ResultBundle::assemble(
            TaskId::new("9h8no", "T", "some_folder"),
            SchemaReport::valid(),
            vec![(
                "A".into(),
                CheckKind::Fairness,
                DispatchOutcome::Completed("PASS".into()),
            )],
        );

        let written = write_report(&bundle, &out, true).unwrap();
        assert_eq!(written.html, out.join("9h8no_some_folder_report.html"));
        assert!(written.html.exists());

        let json_path = written.json.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(value["task"]["owner"], "9h8no");
        assert_eq!(value["fairness"][0]["status"], "PASS");
        assert_eq!(value["fairness"][0]["outcome"]["kind"], "completed");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_write_report_html_only() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ResultBundle::failed(TaskId::new("x", "T", "f"), "boom");
        let written = write_report(&bundle, dir.path(), false).unwrap();
        assert!(written.json.is_none());
        assert!(!json_report_path(dir.path(), &bundle).exists());
    }
}
