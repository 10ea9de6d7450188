use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

use crate::contract::{CommandOutput, CommandRunner, Invocation};
use crate::error::RunError;

/// Runs external programs as Tokio child processes.
///
/// The child is killed when its timeout expires: the pending wait future is
/// dropped and `kill_on_drop` reaps the process.
#[derive(Debug, Default, Clone)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput, RunError> {
        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            timeout_ms = invocation.timeout.as_millis() as u64,
            "Spawning external command"
        );

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    debug!(program = %invocation.program, "Program not found on PATH");
                    RunError::NotFound(invocation.program.clone())
                } else {
                    error!(error = ?e, program = %invocation.program, "Failed to spawn command");
                    RunError::Io(e)
                }
            })?;

        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(result) => result?,
            Err(_) => {
                error!(
                    program = %invocation.program,
                    args = ?invocation.args,
                    "Command timed out, child process terminated"
                );
                return Err(RunError::TimedOut(invocation.timeout));
            }
        };

        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            program = %invocation.program,
            success = result.success,
            code = ?result.code,
            "Command finished"
        );
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let runner = TokioCommandRunner::new();
        let inv = Invocation::new(
            "resume-pin-definitely-missing-binary",
            ["--version"],
            Duration::from_secs(5),
        );
        let err = runner.run(inv).await.unwrap_err();
        assert!(matches!(err, RunError::NotFound(_)));
    }

    #[tokio::test]
    async fn captures_both_streams_and_exit_status() {
        let runner = TokioCommandRunner::new();
        let inv = Invocation::new(
            "sh",
            ["-c", "echo hello; echo oops >&2; exit 3"],
            Duration::from_secs(5),
        );
        let out = runner.run(inv).await.expect("sh should run");
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let runner = TokioCommandRunner::new();
        let inv = Invocation::new("sleep", ["5"], Duration::from_millis(100));
        let started = Instant::now();
        let err = runner.run(inv).await.unwrap_err();
        assert!(matches!(err, RunError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
