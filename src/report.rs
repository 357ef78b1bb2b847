//! Run reports: `reports/<version>.json` and `reports/<version>.md`.
use crate::runner::{TestResult, TestStatus};
use crate::util::write_text;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub version: String,
    pub timestamp: String,
    pub results: Vec<TestResult>,
}

/// Per-status counts shown at the bottom of the Markdown report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub total: usize,
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub errors: usize,
}

impl Totals {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut totals = Totals {
            total: results.len(),
            ..Totals::default()
        };
        for result in results {
            match result.status {
                TestStatus::Passed => totals.passed += 1,
                TestStatus::Skipped => totals.skipped += 1,
                TestStatus::Failed => totals.failed += 1,
                TestStatus::Timeout => totals.timed_out += 1,
                TestStatus::Error => totals.errors += 1,
            }
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

impl Report {
    pub fn totals(&self) -> Totals {
        Totals::from_results(&self.results)
    }

    pub fn render_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Rapport de tests {}", self.version);
        md.push('\n');
        let _ = writeln!(md, "Date : {}", self.timestamp);
        md.push('\n');
        md.push_str("| Script | Status | Duration |\n");
        md.push_str("|---|---|---|\n");
        for result in &self.results {
            let _ = writeln!(
                md,
                "| {} | {} | {:.2}s |",
                result.script, result.status, result.duration
            );
        }
        let totals = self.totals();
        md.push('\n');
        md.push_str("## Totals\n\n");
        let _ = writeln!(md, "- Total: {}", totals.total);
        let _ = writeln!(md, "- Passed: {}", totals.passed);
        let _ = writeln!(md, "- Skipped: {}", totals.skipped);
        let _ = writeln!(md, "- Failed: {}", totals.failed);
        let _ = writeln!(md, "- Timed out: {}", totals.timed_out);
        let _ = writeln!(md, "- Errors: {}", totals.errors);

        let failing: Vec<&TestResult> = self
            .results
            .iter()
            .filter(|result| !result.failures.is_empty() || result.error.is_some())
            .collect();
        if !failing.is_empty() {
            md.push_str("\n## Details\n");
            for result in failing {
                let _ = writeln!(md, "\n### {}\n", result.script);
                if let Some(error) = &result.error {
                    let _ = writeln!(md, "- error: {error}");
                }
                for failure in &result.failures {
                    let _ = writeln!(md, "- {failure}");
                }
                if let Some(log) = &result.log {
                    let _ = writeln!(md, "- log: `{log}`");
                }
            }
        }
        md
    }
}

pub fn report_paths(reports_dir: &Path, version: &str) -> ReportPaths {
    ReportPaths {
        json: reports_dir.join(format!("{version}.json")),
        markdown: reports_dir.join(format!("{version}.md")),
    }
}

/// Persist the JSON and Markdown pair; any failure aborts the run.
pub fn write_reports(reports_dir: &Path, report: &Report) -> Result<ReportPaths> {
    let paths = report_paths(reports_dir, &report.version);
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    write_text(&paths.json, &json)?;
    write_text(&paths.markdown, &report.render_markdown())?;
    tracing::info!(
        json = %paths.json.display(),
        markdown = %paths.markdown.display(),
        "reports written"
    );
    Ok(paths)
}

#[cfg(test)]
pub(crate) fn read_report(path: &Path) -> Result<Report> {
    let bytes = std::fs::read(path).with_context(|| format!("read report {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse report {}", path.display()))
}
