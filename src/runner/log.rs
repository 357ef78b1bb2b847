//! Per-script diagnostic logs under `build/logs/`.
use crate::process::ProcessCapture;
use crate::util::write_text;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub(super) struct LogRecord<'a> {
    pub script: &'a str,
    pub command: &'a str,
    pub cwd: &'a Path,
    pub database: &'a Path,
    pub capture: Option<&'a ProcessCapture>,
    pub expected_found: Option<bool>,
    pub error: Option<&'a str>,
}

pub(super) fn log_path(logs_dir: &Path, script: &str, timestamp: &str) -> PathBuf {
    logs_dir.join(format!("{script}_{timestamp}.log"))
}

pub(super) fn render_log(record: &LogRecord<'_>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "script: {}", record.script);
    let _ = writeln!(text, "command: {}", record.command);
    let _ = writeln!(text, "cwd: {}", record.cwd.display());
    let _ = writeln!(
        text,
        "database: {} (exists: {})",
        record.database.display(),
        record.database.is_file()
    );
    if let Some(error) = record.error {
        let _ = writeln!(text, "error: {error}");
    }
    if let Some(capture) = record.capture {
        let _ = writeln!(text, "exit code: {}", capture.exit_label());
        let _ = writeln!(
            text,
            "duration: {:.2}s",
            capture.duration.as_secs_f64()
        );
    }
    let expected = match record.expected_found {
        Some(true) => "yes",
        Some(false) => "no",
        None => "n/a",
    };
    let _ = writeln!(text, "expected output found: {expected}");
    if let Some(capture) = record.capture {
        let _ = writeln!(text, "\n--- stdout ---\n{}", capture.stdout);
        let _ = writeln!(text, "--- stderr ---\n{}", capture.stderr);
    }
    text
}

pub(super) fn write_log(path: &Path, record: &LogRecord<'_>) -> Result<()> {
    write_text(path, &render_log(record))
}
