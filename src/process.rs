//! Blocking child-process execution with a wall-clock bound.
//!
//! Every subprocess the harness starts (scenario children, the AUT, git, the
//! weekly journey) goes through [`run_captured_in`]. Pipes are drained on
//! helper threads so a chatty child can never stall on a full pipe while we
//! poll. Scenario children get their own process group; the AUT joins the
//! group of the scenario that drives it.
use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit code reported for a child that was killed at its deadline.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

#[derive(Debug, Clone)]
pub struct ProcessCapture {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration: Duration,
}

impl ProcessCapture {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, the way the scenarios inspect AUT output.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }

    pub fn exit_label(&self) -> String {
        if self.timed_out {
            return "timed out".to_string();
        }
        match self.exit_code {
            Some(code) => code.to_string(),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Shell-quoted rendering of `command` for logs and reports.
pub fn describe_command(command: &Command) -> String {
    shell_words::join(
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|word| word.to_string_lossy().into_owned()),
    )
}

/// Where a spawned child lives relative to our own process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessGroup {
    /// A fresh group; a timeout kills the child and all of its descendants.
    Isolated,
    /// Our group, so whoever kills our group takes the child down with us.
    Inherited,
}

/// Spawn `command` in its own process group, feed `stdin` (or null), and
/// wait at most `timeout`.
///
/// Returns `Err` only when the child cannot be spawned or waited on; a
/// timeout is reported through [`ProcessCapture::timed_out`].
pub fn run_captured(
    command: Command,
    stdin: Option<&str>,
    timeout: Duration,
) -> Result<ProcessCapture> {
    run_captured_in(command, stdin, timeout, ProcessGroup::Isolated)
}

/// [`run_captured`] with an explicit process-group placement.
pub fn run_captured_in(
    mut command: Command,
    stdin: Option<&str>,
    timeout: Duration,
    group: ProcessGroup,
) -> Result<ProcessCapture> {
    let program = command.get_program().to_string_lossy().to_string();
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if group == ProcessGroup::Isolated {
        isolate_process_group(&mut command);
    }

    let start = Instant::now();
    let mut child = command
        .spawn()
        .with_context(|| format!("spawn {program}"))?;

    let stdin_handle = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            // A child that exits before reading everything closes the pipe;
            // the resulting EPIPE is not interesting.
            Some(thread::spawn(move || {
                let _ = pipe.write_all(input.as_bytes());
            }))
        }
        _ => None,
    };
    let stdout_handle = child.stdout.take().map(spawn_reader);
    let stderr_handle = child.stderr.take().map(spawn_reader);

    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("check status of {program}"))?
        {
            break Some(status);
        }
        if start.elapsed() >= timeout {
            timed_out = true;
            kill_tree(&mut child, group);
            break child.wait().ok();
        }
        thread::sleep(POLL_INTERVAL);
    };
    let duration = start.elapsed();

    if let Some(handle) = stdin_handle {
        let _ = handle.join();
    }
    let stdout = join_reader(stdout_handle);
    let stderr = join_reader(stderr_handle);

    tracing::debug!(
        program = %program,
        elapsed_ms = duration.as_millis() as u64,
        timed_out,
        exit = ?status.as_ref().and_then(ExitStatus::code),
        "child finished"
    );

    Ok(ProcessCapture {
        exit_code: if timed_out {
            None
        } else {
            status.and_then(|status| status.code())
        },
        stdout,
        stderr,
        timed_out,
        duration,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(unix)]
fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_command: &mut Command) {}

/// Kill the child and, on Unix, every process in its isolated group. A
/// scenario's AUT is spawned `Inherited`, so killing the scenario's group
/// also kills the AUT.
#[cfg(unix)]
fn kill_tree(child: &mut Child, group: ProcessGroup) {
    if group == ProcessGroup::Isolated {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: kill(2) with a negative pid only sends a signal to the
            // process group we created in `isolate_process_group`.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child, _group: ProcessGroup) {
    let _ = child.kill();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let mut command = Command::new(sh);
        command.args(["-c", "echo produit; echo oops >&2; exit 3"]);
        let capture = run_captured(command, None, Duration::from_secs(10)).unwrap();
        assert!(!capture.timed_out);
        assert_eq!(capture.exit_code, Some(3));
        assert_eq!(capture.stdout.trim(), "produit");
        assert_eq!(capture.stderr.trim(), "oops");
        assert!(!capture.success());
        assert_eq!(capture.combined(), "produit\noops\n");
    }

    #[test]
    fn feeds_stdin_transcript() {
        let Ok(cat) = which::which("cat") else {
            return;
        };
        let capture = run_captured(
            Command::new(cat),
            Some("1\nClavier\n0\n"),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(capture.success());
        assert_eq!(capture.stdout, "1\nClavier\n0\n");
    }

    #[test]
    fn kills_child_at_deadline() {
        let Ok(sleep) = which::which("sleep") else {
            return;
        };
        let mut command = Command::new(sleep);
        command.arg("30");
        let capture = run_captured(command, None, Duration::from_millis(200)).unwrap();
        assert!(capture.timed_out);
        assert_eq!(capture.exit_code, None);
        assert_eq!(capture.exit_label(), "timed out");
        assert!(capture.duration < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn inherited_child_shares_our_process_group() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let ours = unsafe { libc::getpgrp() };
        let pgid_of_child = |group: ProcessGroup| {
            let mut command = Command::new(&sh);
            command.args(["-c", "ps -o pgid= -p $$"]);
            let capture = run_captured_in(command, None, Duration::from_secs(10), group).unwrap();
            capture.stdout.trim().parse::<libc::pid_t>().ok()
        };
        let Some(inherited) = pgid_of_child(ProcessGroup::Inherited) else {
            return;
        };
        assert_eq!(inherited, ours);
        let isolated = pgid_of_child(ProcessGroup::Isolated).unwrap();
        assert_ne!(isolated, ours);
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let command = Command::new("/definitely/not/a/real/binary");
        let err = run_captured(command, None, Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("spawn"));
    }
}
