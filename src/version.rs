//! Release tag discovery from recent commit subjects.
use crate::process::run_captured;
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Returned whenever no `[vvX.Y]` tag can be found.
pub const UNKNOWN_VERSION: &str = "vv_unknown";
pub const DEFAULT_COMMIT_WINDOW: usize = 10;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Scan the last `window` commit subjects of the repository at `repo_root`.
///
/// Never fails: a missing `git`, a directory outside any repository, or a
/// window without a tag all resolve to [`UNKNOWN_VERSION`].
pub fn resolve_version(repo_root: &Path, window: usize) -> String {
    match which::which("git") {
        Ok(git) => resolve_version_with(&git, repo_root, window),
        Err(err) => {
            tracing::warn!(error = %err, "git not found on PATH; using sentinel version");
            UNKNOWN_VERSION.to_string()
        }
    }
}

fn resolve_version_with(git: &Path, repo_root: &Path, window: usize) -> String {
    let mut command = Command::new(git);
    command
        .args(["log", "--pretty=format:%s", "-n"])
        .arg(window.to_string())
        .current_dir(repo_root);

    let capture = match run_captured(command, None, GIT_TIMEOUT) {
        Ok(capture) => capture,
        Err(err) => {
            tracing::warn!(error = %err, "git log unavailable; using sentinel version");
            return UNKNOWN_VERSION.to_string();
        }
    };
    if !capture.success() {
        tracing::warn!(
            exit = %capture.exit_label(),
            stderr = %capture.stderr.trim(),
            "git log failed; using sentinel version"
        );
        return UNKNOWN_VERSION.to_string();
    }

    match extract_version(&capture.stdout) {
        Some(version) => {
            tracing::info!(%version, "resolved version from commit history");
            version
        }
        None => {
            tracing::info!(window, "no version tag in recent commits");
            UNKNOWN_VERSION.to_string()
        }
    }
}

/// First `[vvX.Y]` tag in `subjects` (one subject per line, newest first),
/// without its brackets.
pub fn extract_version(subjects: &str) -> Option<String> {
    let re = Regex::new(r"\[(vv\d+\.\d+)\]").ok()?;
    subjects
        .lines()
        .find_map(|line| re.captures(line).map(|caps| caps[1].to_string()))
}
