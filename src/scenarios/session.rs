//! One AUT process per session: spawn, type the transcript, capture output.
use super::transcript::Transcript;
use crate::normalize::normalize;
use crate::process::{run_captured_in, ProcessCapture, ProcessGroup};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub const TEST_MODE_FLAG: &str = "--test-mode";
pub const TEST_SMOKE_FLAG: &str = "--test-smoke";

/// The application under test and the directory it runs in.
#[derive(Debug, Clone)]
pub struct Aut {
    pub binary: PathBuf,
    pub cwd: PathBuf,
}

/// Output of one AUT session.
#[derive(Debug, Clone)]
pub struct Session {
    pub capture: ProcessCapture,
    pub normalized: String,
}

impl Session {
    /// Problems with how the process ended, independent of its output.
    pub fn exit_failures(&self, label: &str) -> Vec<String> {
        if self.capture.timed_out {
            return vec![format!(
                "{label}: timed out after {:.1}s (blocking read or unexpected pause?)",
                self.capture.duration.as_secs_f64()
            )];
        }
        if self.capture.exit_code != Some(0) {
            return vec![format!(
                "{label}: unexpected exit status {}",
                self.capture.exit_label()
            )];
        }
        Vec::new()
    }
}

impl Aut {
    pub fn new(binary: &Path, cwd: &Path) -> Self {
        Aut {
            binary: binary.to_path_buf(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.binary.is_file()
    }

    /// Run the AUT with `flags`, feeding `transcript` (or nothing).
    pub fn session(
        &self,
        label: &str,
        flags: &[&str],
        transcript: Option<&Transcript>,
        timeout: Duration,
    ) -> Result<Session> {
        let mut command = Command::new(&self.binary);
        command.args(flags).current_dir(&self.cwd);
        let input = transcript.map(Transcript::render);
        tracing::debug!(
            session = label,
            binary = %self.binary.display(),
            lines = transcript.map(|t| t.lines().len()).unwrap_or(0),
            "starting AUT session"
        );
        // The AUT stays in our process group so a runner timeout on this
        // scenario kills it too.
        let capture = run_captured_in(command, input.as_deref(), timeout, ProcessGroup::Inherited)
            .with_context(|| format!("launch AUT {} for {label}", self.binary.display()))?;

        // AUT chatter goes to stderr; stdout is reserved for verdict lines.
        eprintln!("--- {label}: stdout ---\n{}", capture.stdout);
        eprintln!("--- {label}: stderr ---\n{}", capture.stderr);

        let normalized = normalize(&capture.combined());
        Ok(Session {
            capture,
            normalized,
        })
    }
}
