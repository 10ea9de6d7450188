use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::contract::{CommandRunner, Invocation};

/// Checks whether the publishing tool can be called, via `<program> --version`.
#[derive(Clone)]
pub struct CliProber {
    runner: Arc<dyn CommandRunner>,
    program: String,
    timeout: Duration,
}

impl CliProber {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// True iff the version query exits successfully within the timeout.
    pub async fn probe(&self) -> bool {
        let invocation = Invocation::new(&self.program, ["--version"], self.timeout);
        match self.runner.run(invocation).await {
            Ok(out) if out.success => {
                info!(program = %self.program, version = %out.stdout.trim(), "[PROBE] CLI available");
                true
            }
            Ok(out) => {
                debug!(program = %self.program, code = ?out.code, "[PROBE] Version query exited non-zero");
                false
            }
            Err(e) => {
                debug!(program = %self.program, error = %e, "[PROBE] Version query failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CommandOutput, MockCommandRunner};
    use crate::error::RunError;

    fn prober_with(runner: MockCommandRunner) -> CliProber {
        CliProber::new(Arc::new(runner), "pinme", Duration::from_secs(10))
    }

    #[tokio::test]
    async fn successful_version_query_is_available() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.program == "pinme" && inv.args == ["--version"])
            .times(1)
            .returning(|_| {
                Ok(CommandOutput {
                    success: true,
                    code: Some(0),
                    stdout: "1.2.0\n".into(),
                    stderr: String::new(),
                })
            });
        assert!(prober_with(runner).probe().await);
    }

    #[tokio::test]
    async fn failures_are_unavailable() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Err(RunError::NotFound("pinme".into())));
        assert!(!prober_with(runner).probe().await);

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|inv| Err(RunError::TimedOut(inv.timeout)));
        assert!(!prober_with(runner).probe().await);

        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Ok(CommandOutput {
                success: false,
                code: Some(127),
                ..Default::default()
            })
        });
        assert!(!prober_with(runner).probe().await);
    }
}
