//! Sequential, registry-driven test execution.
//!
//! Every selected entry is resolved to a command (a built-in scenario run
//! through our own executable, or an external script), spawned in the build
//! directory with a bounded timeout, classified, and logged. A broken script
//! never stops the run; it becomes an ERROR result.
mod classify;
mod log;

use crate::config::HarnessConfig;
use crate::process::{describe_command, run_captured, ProcessCapture, TIMEOUT_EXIT_CODE};
use crate::registry::{RegistryEntry, TestKind};
use crate::scenarios::ScenarioId;
use crate::util::{round_secs, timestamp_now};
use anyhow::{anyhow, Result};
use classify::{classify, Classification};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Timeout,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::Skipped => "SKIPPED",
            TestStatus::Timeout => "TIMEOUT",
            TestStatus::Error => "ERROR",
        }
    }

    /// Rank used to pick the worst outcome of a run.
    pub fn severity(&self) -> u8 {
        match self {
            TestStatus::Passed => 0,
            TestStatus::Skipped => 1,
            TestStatus::Failed => 2,
            TestStatus::Error => 3,
            TestStatus::Timeout => 4,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            TestStatus::Passed | TestStatus::Skipped => 0,
            TestStatus::Failed => 1,
            TestStatus::Error => 2,
            TestStatus::Timeout => TIMEOUT_EXIT_CODE,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of one executed script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub script: String,
    pub status: TestStatus,
    /// Seconds, rounded to two decimals.
    pub duration: f64,
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl TestResult {
    fn errored(script: &str, elapsed: Duration, error: String) -> Self {
        TestResult {
            script: script.to_string(),
            status: TestStatus::Error,
            duration: round_secs(elapsed.as_secs_f64()),
            stdout: String::new(),
            stderr: String::new(),
            log: None,
            error: Some(error),
            exit_code: None,
            failures: Vec::new(),
        }
    }

    fn classified(
        script: &str,
        capture: ProcessCapture,
        classification: Classification,
        bound: Duration,
    ) -> Self {
        let elapsed = if classification.status == TestStatus::Timeout {
            bound
        } else {
            capture.duration
        };
        TestResult {
            script: script.to_string(),
            status: classification.status,
            duration: round_secs(elapsed.as_secs_f64()),
            stdout: capture.stdout,
            stderr: capture.stderr,
            log: None,
            error: None,
            exit_code: capture.exit_code,
            failures: classification.failures,
        }
    }
}

/// Worst status of a run; `None` for an empty run.
pub fn worst_status(results: &[TestResult]) -> Option<TestStatus> {
    results
        .iter()
        .map(|result| result.status)
        .max_by_key(TestStatus::severity)
}

/// Which entries a run covers.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub kind: Option<TestKind>,
    /// Explicit script names, looked up in the registry; empty means all.
    pub only: Vec<String>,
}

pub struct RunnerContext<'a> {
    pub config: &'a HarnessConfig,
    /// Executable that implements `scenario <name>`, normally ourselves.
    pub scenario_exe: &'a Path,
}

/// How an entry is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScriptCommand {
    Scenario(ScenarioId),
    External(PathBuf),
    Missing(PathBuf),
}

/// Run the selected entries in registry order and collect their results.
pub fn run_all_tests(context: &RunnerContext<'_>, selection: &Selection) -> Vec<TestResult> {
    let registry = &context.config.registry;
    let entries: Vec<RegistryEntry> = if selection.only.is_empty() {
        registry.selected(selection.kind).cloned().collect()
    } else {
        selection
            .only
            .iter()
            .map(|script| registry.lookup(script))
            .filter(|entry| selection.kind.is_none() || selection.kind == Some(entry.kind))
            .collect()
    };

    let mut results = Vec::new();
    for entry in &entries {
        if !entry.run {
            tracing::info!(script = %entry.script, kind = %entry.kind, "skipping");
            continue;
        }
        let result = run_test(context, entry);
        tracing::info!(
            script = %result.script,
            status = %result.status,
            duration = result.duration,
            "test finished"
        );
        results.push(result);
    }
    results
}

/// Execute one entry; never fails, problems become an ERROR result.
pub fn run_test(context: &RunnerContext<'_>, entry: &RegistryEntry) -> TestResult {
    let config = context.config;
    let bound = timeout_for(config, entry);
    let started = Instant::now();
    let resolved = resolve_script(config, entry);
    tracing::info!(script = %entry.script, timeout_secs = bound.as_secs(), "running");

    let database = config.database_path();
    let command_line;
    let mut capture_for_log = None;
    let mut expected_found = None;
    let mut result = match build_command(context, entry, &resolved) {
        Err(err) => {
            command_line = describe_resolution(&resolved);
            TestResult::errored(&entry.script, started.elapsed(), format!("{err:#}"))
        }
        Ok(command) => {
            command_line = describe_command(&command);
            match run_captured(command, entry.stdin.as_deref(), bound) {
                Err(err) => {
                    TestResult::errored(&entry.script, started.elapsed(), format!("{err:#}"))
                }
                Ok(capture) => {
                    let classification = classify(entry, &capture, database.is_file());
                    expected_found = classification.expected_found;
                    let result = TestResult::classified(
                        &entry.script,
                        capture.clone(),
                        classification,
                        bound,
                    );
                    capture_for_log = Some(capture);
                    result
                }
            }
        }
    };

    let path = log::log_path(&config.logs_dir, &entry.script, &timestamp_now());
    let record = log::LogRecord {
        script: &entry.script,
        command: &command_line,
        cwd: &config.build_dir,
        database: &database,
        capture: capture_for_log.as_ref(),
        expected_found,
        error: result.error.as_deref(),
    };
    match log::write_log(&path, &record) {
        Ok(()) => result.log = Some(path.display().to_string()),
        Err(err) => tracing::warn!(
            script = %entry.script,
            error = %format!("{err:#}"),
            "could not write test log"
        ),
    }
    result
}

fn timeout_for(config: &HarnessConfig, entry: &RegistryEntry) -> Duration {
    match (entry.timeout_secs, entry.kind) {
        (Some(secs), _) => Duration::from_secs(secs),
        (None, TestKind::Smoke) => config.smoke_timeout,
        (None, _) => config.default_timeout,
    }
}

/// `<exe> scenario <name> --aut <binary> ...`, run from the build directory.
pub fn scenario_command(config: &HarnessConfig, scenario_exe: &Path, id: ScenarioId) -> Command {
    let mut command = Command::new(scenario_exe);
    command
        .arg("scenario")
        .arg(id.script_name())
        .arg("--aut")
        .arg(&config.aut_binary);
    if let Some(timeout) = config.scenario_timeout {
        command.arg("--timeout-secs").arg(timeout.as_secs().to_string());
    }
    if config.skip_when_aut_missing {
        command.arg("--skip-missing-aut");
    }
    command.current_dir(&config.build_dir);
    command
}

fn resolve_script(config: &HarnessConfig, entry: &RegistryEntry) -> ScriptCommand {
    if let Some(path) = &entry.path {
        let path = config.repo_root.join(path);
        return if path.is_file() {
            ScriptCommand::External(path)
        } else {
            ScriptCommand::Missing(path)
        };
    }
    if let Some(id) = ScenarioId::from_script_name(&entry.script) {
        return ScriptCommand::Scenario(id);
    }
    let plain = config.scripts_dir.join(&entry.script);
    if plain.is_file() {
        return ScriptCommand::External(plain);
    }
    let python = config.scripts_dir.join(format!("{}.py", entry.script));
    if python.is_file() {
        return ScriptCommand::External(python);
    }
    ScriptCommand::Missing(plain)
}

fn build_command(
    context: &RunnerContext<'_>,
    entry: &RegistryEntry,
    resolved: &ScriptCommand,
) -> Result<Command> {
    let config = context.config;
    let mut command = match resolved {
        ScriptCommand::Missing(path) => {
            return Err(anyhow!("script not found: {}", path.display()));
        }
        ScriptCommand::Scenario(id) => scenario_command(config, context.scenario_exe, *id),
        ScriptCommand::External(path) => {
            if path.extension().is_some_and(|ext| ext == "py") {
                let mut command = Command::new(&config.python);
                command.arg(path);
                command
            } else {
                Command::new(path)
            }
        }
    };
    tracing::debug!(script = %entry.script, resolved = ?resolved, "resolved script");
    command.current_dir(&config.build_dir);
    Ok(command)
}

fn describe_resolution(resolved: &ScriptCommand) -> String {
    match resolved {
        ScriptCommand::Scenario(id) => format!("scenario {}", id.script_name()),
        ScriptCommand::External(path) | ScriptCommand::Missing(path) => {
            path.display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
