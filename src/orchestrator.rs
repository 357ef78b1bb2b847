//! One CI invocation: version, suite (or weekly journey), reports, cleanup.
use crate::config::HarnessConfig;
use crate::report::{write_reports, Report, ReportPaths};
use crate::runner::{run_all_tests, worst_status, RunnerContext, Selection, TestResult};
use crate::util::{display_path, timestamp_now};
use crate::version::resolve_version;
use crate::weekly::run_weekly;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct CiOptions {
    pub weekly: bool,
    pub selection: Selection,
    pub clean_database: bool,
}

#[derive(Debug, Clone)]
pub struct CiOutcome {
    pub report: Report,
    pub paths: ReportPaths,
    /// Mirrors the worst result; 0 for an empty run.
    pub exit_code: i32,
}

pub fn run_ci(
    config: &HarnessConfig,
    scenario_exe: &Path,
    options: &CiOptions,
) -> Result<CiOutcome> {
    let version = resolve_version(&config.repo_root, config.version_commit_window);
    let timestamp = timestamp_now();
    tracing::info!(
        version = %version,
        timestamp = %timestamp,
        weekly = options.weekly,
        "starting CI run"
    );

    let results: Vec<TestResult> = if options.weekly {
        let outcome = run_weekly(config, scenario_exe, &timestamp)?;
        vec![outcome.as_test_result()]
    } else {
        let context = RunnerContext {
            config,
            scenario_exe,
        };
        run_all_tests(&context, &options.selection)
    };

    let report = Report {
        version,
        timestamp,
        results,
    };
    let paths = write_reports(&config.reports_dir, &report)?;

    if options.clean_database || config.clean_database {
        delete_database(config)?;
    }

    let exit_code = worst_status(&report.results)
        .map(|status| status.exit_code())
        .unwrap_or(0);
    Ok(CiOutcome {
        report,
        paths,
        exit_code,
    })
}

/// Remove the transient database left in the build directory, if any.
pub fn delete_database(config: &HarnessConfig) -> Result<()> {
    let path = config.database_path();
    if !path.exists() {
        return Ok(());
    }
    fs::remove_file(&path).with_context(|| format!("delete database {}", path.display()))?;
    tracing::info!(
        path = %display_path(&path, Some(&config.repo_root)),
        "deleted temporary database"
    );
    Ok(())
}

/// One line per result plus totals, for the terminal.
pub fn print_summary(outcome: &CiOutcome, repo_root: &Path) {
    println!("Version: {}", outcome.report.version);
    for result in &outcome.report.results {
        println!(
            "  {:<24} {:<8} {:>8.2}s",
            result.script, result.status, result.duration
        );
        for failure in &result.failures {
            println!("      - {failure}");
        }
        if let Some(error) = &result.error {
            println!("      - {error}");
        }
    }
    let totals = outcome.report.totals();
    println!(
        "Total: {} | Passed: {} | Skipped: {} | Failed: {} | Timed out: {} | Errors: {}",
        totals.total,
        totals.passed,
        totals.skipped,
        totals.failed,
        totals.timed_out,
        totals.errors
    );
    println!(
        "Reports: {} {}",
        display_path(&outcome.paths.json, Some(repo_root)),
        display_path(&outcome.paths.markdown, Some(repo_root))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_config, ConfigFile};
    use crate::registry::{RegistryEntry, TestKind};
    use crate::report::read_report;
    use crate::runner::TestStatus;
    use tempfile::TempDir;

    fn config(root: &Path, entries: Vec<RegistryEntry>) -> HarnessConfig {
        fs::create_dir_all(root.join("build")).unwrap();
        let file = ConfigFile {
            registry: Some(entries),
            ..ConfigFile::default()
        };
        resolve_config(root, file).unwrap()
    }

    #[test]
    fn empty_run_exits_zero_and_still_reports() {
        let root = TempDir::new().unwrap();
        let mut disabled = RegistryEntry::unregistered("theme_init");
        disabled.run = false;
        disabled.kind = TestKind::NonTest;
        let config = config(root.path(), vec![disabled]);

        let outcome = run_ci(&config, Path::new("/nonexistent"), &CiOptions::default()).unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.report.results.is_empty());
        // Not a git repository, so the sentinel names the report.
        assert_eq!(outcome.report.version, "vv_unknown");
        assert!(config.reports_dir.join("vv_unknown.json").is_file());
        assert!(config.reports_dir.join("vv_unknown.md").is_file());
    }

    #[test]
    fn missing_script_maps_to_error_exit_code() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), vec![RegistryEntry::unregistered("ghost")]);
        let outcome = run_ci(&config, Path::new("/nonexistent"), &CiOptions::default()).unwrap();
        assert_eq!(outcome.exit_code, 2);
        let report = read_report(&outcome.paths.json).unwrap();
        assert_eq!(report.results[0].status, TestStatus::Error);
    }

    #[test]
    fn clean_db_removes_database() {
        let root = TempDir::new().unwrap();
        let mut disabled = RegistryEntry::unregistered("noop");
        disabled.run = false;
        let config = config(root.path(), vec![disabled]);
        fs::write(config.database_path(), "1\tClavier\t25\t49.99\n").unwrap();

        let options = CiOptions {
            clean_database: true,
            ..CiOptions::default()
        };
        run_ci(&config, Path::new("/nonexistent"), &options).unwrap();
        assert!(!config.database_path().exists());
        // A second delete of a missing file is fine.
        delete_database(&config).unwrap();
    }

    #[test]
    fn report_write_failure_aborts() {
        let root = TempDir::new().unwrap();
        let mut config = config(root.path(), vec![]);
        let blocker = root.path().join("blocked");
        fs::write(&blocker, "file").unwrap();
        config.reports_dir = blocker.join("reports");
        assert!(run_ci(&config, Path::new("/nonexistent"), &CiOptions::default()).is_err());
    }
}
