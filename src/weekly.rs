//! Weekly full-journey run with dated artifacts under `weekly_test/`.
use crate::config::HarnessConfig;
use crate::process::{describe_command, run_captured, TIMEOUT_EXIT_CODE};
use crate::runner::{scenario_command, TestResult, TestStatus};
use crate::scenarios::ScenarioId;
use crate::util::{round_secs, truncate_string, write_text};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bytes of stdout/stderr kept in the weekly JSON record and the CI report.
pub const OUTPUT_EXCERPT_BYTES: usize = 300;

/// Exit code used when the journey could not be started at all.
const SPAWN_FAILURE_EXIT_CODE: i32 = 2;

/// Contents of `weekly_test/result_<timestamp>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecord {
    pub status: TestStatus,
    pub command: String,
    pub return_code: i32,
    pub timestamp: String,
    pub duration: f64,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct WeeklyOutcome {
    pub record: WeeklyRecord,
    pub error: Option<String>,
    pub report_path: PathBuf,
    pub result_path: PathBuf,
}

impl WeeklyOutcome {
    /// The outcome as the single result of a `ci --weekly` report.
    pub fn as_test_result(&self) -> TestResult {
        TestResult {
            script: ScenarioId::FullJourney.script_name().to_string(),
            status: self.record.status,
            duration: self.record.duration,
            stdout: self.record.stdout.clone(),
            stderr: self.record.stderr.clone(),
            log: Some(self.report_path.display().to_string()),
            error: self.error.clone(),
            exit_code: Some(self.record.return_code),
            failures: Vec::new(),
        }
    }
}

/// Run the full journey once and persist the weekly log/JSON pair.
///
/// Artifact write failures are errors; a failing or hanging journey is not.
pub fn run_weekly(
    config: &HarnessConfig,
    scenario_exe: &Path,
    timestamp: &str,
) -> Result<WeeklyOutcome> {
    let command = scenario_command(config, scenario_exe, ScenarioId::FullJourney);
    let command_line = describe_command(&command);
    tracing::info!(
        command = %command_line,
        timeout_secs = config.weekly_timeout.as_secs(),
        "starting weekly journey"
    );

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut error = None;
    let (status, return_code, duration) =
        match run_captured(command, None, config.weekly_timeout) {
            Ok(capture) => {
                let outcome = if capture.timed_out {
                    (TestStatus::Timeout, TIMEOUT_EXIT_CODE, config.weekly_timeout)
                } else {
                    match capture.exit_code {
                        Some(0) => (TestStatus::Passed, 0, capture.duration),
                        code => (TestStatus::Failed, code.unwrap_or(1), capture.duration),
                    }
                };
                stdout = capture.stdout;
                stderr = capture.stderr;
                outcome
            }
            Err(err) => {
                error = Some(format!("{err:#}"));
                (TestStatus::Error, SPAWN_FAILURE_EXIT_CODE, Duration::ZERO)
            }
        };

    let report_path = config.weekly_dir.join(format!("report_{timestamp}.txt"));
    let result_path = config.weekly_dir.join(format!("result_{timestamp}.json"));

    let mut text = String::new();
    let _ = writeln!(text, "command: {command_line}");
    let _ = writeln!(text, "return code: {return_code}");
    if let Some(error) = &error {
        let _ = writeln!(text, "error: {error}");
    }
    let _ = writeln!(text, "\n--- stdout ---\n{stdout}");
    let _ = writeln!(text, "--- stderr ---\n{stderr}");
    write_text(&report_path, &text)?;

    let record = WeeklyRecord {
        status,
        command: command_line,
        return_code,
        timestamp: timestamp.to_string(),
        duration: round_secs(duration.as_secs_f64()),
        stdout: truncate_string(&stdout, OUTPUT_EXCERPT_BYTES),
        stderr: truncate_string(&stderr, OUTPUT_EXCERPT_BYTES),
    };
    let json = serde_json::to_string_pretty(&record).context("serialize weekly result")?;
    write_text(&result_path, &json)?;

    tracing::info!(
        status = %record.status,
        return_code,
        path = %result_path.display(),
        "weekly journey finished"
    );
    Ok(WeeklyOutcome {
        record,
        error,
        report_path,
        result_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_config, ConfigFile};
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path, weekly_timeout_secs: u64) -> HarnessConfig {
        fs::create_dir_all(root.join("build")).unwrap();
        let file = ConfigFile {
            weekly_timeout_secs,
            ..ConfigFile::default()
        };
        resolve_config(root, file).unwrap()
    }

    #[cfg(unix)]
    fn fake_exe(root: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = root.join("fake-stock-ci");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn writes_dated_artifacts_and_truncates_json_output() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), 30);
        let exe = fake_exe(
            root.path(),
            "i=0; while [ $i -lt 100 ]; do printf 'Parcours '; i=$((i+1)); done; echo; echo \"$@\"",
        );

        let outcome = run_weekly(&config, &exe, "2024-05-06_03-00-00").unwrap();
        assert_eq!(outcome.record.status, TestStatus::Passed);
        assert_eq!(outcome.record.return_code, 0);
        assert_eq!(
            outcome.result_path,
            config.weekly_dir.join("result_2024-05-06_03-00-00.json")
        );
        assert!(outcome.record.stdout.len() <= OUTPUT_EXCERPT_BYTES);
        assert!(outcome.record.command.contains("scenario full_journey_test --aut"));

        let report = fs::read_to_string(&outcome.report_path).unwrap();
        assert!(report.contains("return code: 0"));
        assert!(report.contains("scenario full_journey_test --aut"));

        let json: WeeklyRecord =
            serde_json::from_slice(&fs::read(&outcome.result_path).unwrap()).unwrap();
        assert_eq!(json, outcome.record);
    }

    #[cfg(unix)]
    #[test]
    fn child_exit_code_is_kept() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), 30);
        let exe = fake_exe(root.path(), "echo 'Échec du scénario'; exit 1");
        let outcome = run_weekly(&config, &exe, "2024-05-06_03-00-00").unwrap();
        assert_eq!(outcome.record.status, TestStatus::Failed);
        assert_eq!(outcome.record.return_code, 1);
        assert_eq!(outcome.as_test_result().script, "full_journey_test");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_maps_to_124() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), 1);
        let exe = fake_exe(root.path(), "sleep 30");
        let outcome = run_weekly(&config, &exe, "2024-05-06_03-00-00").unwrap();
        assert_eq!(outcome.record.status, TestStatus::Timeout);
        assert_eq!(outcome.record.return_code, 124);
        assert_eq!(outcome.record.duration, 1.0);
    }

    #[test]
    fn missing_executable_is_recorded_not_raised() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), 5);
        let outcome = run_weekly(
            &config,
            Path::new("/nonexistent/stock-ci"),
            "2024-05-06_03-00-00",
        )
        .unwrap();
        assert_eq!(outcome.record.status, TestStatus::Error);
        assert!(outcome.error.is_some());
        assert!(outcome.result_path.is_file());
    }
}
