//! Renders a finished run to disk.
//!
//! Two artifacts per run: `survey.md` with the readable findings and
//! `survey.json` with the full outcome for downstream tooling.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use surveyor_core::PipelineOutcome;

pub const REPORT_MD: &str = "survey.md";
pub const REPORT_JSON: &str = "survey.json";

pub struct ReportPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write both report files, creating the output directory if needed.
    /// Partial outcomes are written too; a fatal run still gets a report.
    pub fn write(&self, project: &str, outcome: &PipelineOutcome) -> Result<ReportPaths> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let markdown = self.output_dir.join(REPORT_MD);
        write_file(&markdown, &render_markdown(project, outcome))?;

        let json = self.output_dir.join(REPORT_JSON);
        let payload = serde_json::to_string_pretty(outcome)?;
        write_file(&json, &payload)?;

        Ok(ReportPaths { markdown, json })
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn render_markdown(project: &str, outcome: &PipelineOutcome) -> String {
    let elapsed = (outcome.completed_at - outcome.started_at).num_seconds();

    let mut doc = String::new();
    doc.push_str(&format!("# Codebase Survey: {}\n\n", project));
    doc.push_str(&format!("- Run: `{}`\n", outcome.run_id));
    doc.push_str(&format!("- Status: {}\n", outcome.status.as_str()));
    doc.push_str(&format!("- Started: {}\n", outcome.started_at.to_rfc3339()));
    doc.push_str(&format!("- Elapsed: {}s\n", elapsed));

    if let Some(failure) = &outcome.failure {
        doc.push_str("\n## Failure\n\n");
        doc.push_str(failure);
        doc.push('\n');
    }

    if !outcome.warnings.is_empty() {
        doc.push_str("\n## Warnings\n\n");
        for warning in &outcome.warnings {
            doc.push_str(&format!("- {}\n", warning));
        }
    }

    for result in &outcome.results {
        doc.push_str(&format!("\n## {}\n\n", result.phase.name()));
        if result.payload.is_empty() {
            doc.push_str("_No findings recorded for this phase._\n");
        } else {
            doc.push_str(&result.payload);
            doc.push('\n');
        }
    }

    let tasks: Vec<_> = outcome
        .results
        .iter()
        .flat_map(|result| &result.task_results)
        .collect();

    if !tasks.is_empty() {
        doc.push_str("\n## Task Outcomes\n\n");
        doc.push_str("| Task | Status | Attempts | Duration |\n");
        doc.push_str("|------|--------|----------|----------|\n");
        for task in tasks {
            doc.push_str(&format!(
                "| {} | {} | {} | {}ms |\n",
                task.task_name,
                task.status.as_str(),
                task.attempts,
                task.duration_ms
            ));
        }
    }

    doc
}
