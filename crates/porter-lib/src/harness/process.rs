//! Bounded external process execution

use super::commands::CommandLine;
use crate::error::{PorterError, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Which harness step a process belongs to, deciding its failure variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Execute,
}

impl Stage {
    pub fn failure(self, command: &CommandLine, exit_code: Option<i32>, output: String) -> PorterError {
        let command = command.to_string();
        match self {
            Stage::Compile => PorterError::CompilationFailure {
                command,
                exit_code,
                output,
            },
            Stage::Execute => PorterError::ExecutionFailure {
                command,
                exit_code,
                output,
            },
        }
    }
}

/// Captured result of a process that exited on its own
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Finished {
    /// Stdout followed by stderr, for error reports
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Run `command` inside `dir` and require a zero exit status
pub fn run_checked(
    command: &CommandLine,
    dir: &Path,
    timeout: Duration,
    stage: Stage,
) -> Result<Finished> {
    let finished = run(command, dir, timeout, stage)?;
    if finished.status.success() {
        Ok(finished)
    } else {
        Err(stage.failure(command, finished.status.code(), finished.combined()))
    }
}

/// Run `command` inside `dir`, killing it once `timeout` elapses
pub fn run(command: &CommandLine, dir: &Path, timeout: Duration, stage: Stage) -> Result<Finished> {
    // workspace binaries are resolved against the workspace, not our cwd
    let program = if command.is_local() {
        dir.join(&command.program[2..]).into_os_string()
    } else {
        command.program.clone().into()
    };

    let mut child = Command::new(program)
        .args(&command.args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| stage.failure(command, None, format!("failed to start: {}", e)))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(status) => status,
        Err(e) => {
            // grandchildren may still hold the pipes; the drain threads are left detached
            drop((stdout, stderr));
            return Err(e.unwrap_or_else(|| PorterError::Timeout {
                command: command.to_string(),
                timeout,
            }));
        }
    };

    Ok(Finished {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

/// `Err(None)` on timeout, `Err(Some(_))` when waiting itself failed
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> std::result::Result<ExitStatus, Option<PorterError>> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(
                        pid = child.id(),
                        timeout_secs = timeout.as_secs_f64(),
                        "Killed process after timeout"
                    );
                    return Err(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Some(PorterError::ExecutionFailure {
                    command: format!("pid {}", child.id()),
                    exit_code: None,
                    output: e.to_string(),
                }));
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandLine {
        CommandLine {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn test_output_captured() {
        let dir = tempfile::tempdir().unwrap();
        let done = run_checked(
            &sh("echo 42; echo warn >&2"),
            dir.path(),
            Duration::from_secs(10),
            Stage::Execute,
        )
        .unwrap();
        assert_eq!(done.stdout.trim(), "42");
        assert_eq!(done.stderr.trim(), "warn");
    }

    #[test]
    fn test_nonzero_exit_keeps_code_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_checked(
            &sh("echo 'brain.c:1: error' >&2; exit 3"),
            dir.path(),
            Duration::from_secs(10),
            Stage::Compile,
        )
        .unwrap_err();
        match err {
            PorterError::CompilationFailure {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert!(output.contains("brain.c:1: error"));
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_hanging_process_killed() {
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        let err = run(
            &sh("sleep 30"),
            dir.path(),
            Duration::from_millis(200),
            Stage::Execute,
        )
        .unwrap_err();
        assert!(matches!(err, PorterError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_stage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = CommandLine {
            program: "./brain".to_string(),
            args: vec![],
        };
        let err = run(&command, dir.path(), Duration::from_secs(1), Stage::Execute).unwrap_err();
        assert!(matches!(err, PorterError::ExecutionFailure { exit_code: None, .. }));
    }
}
