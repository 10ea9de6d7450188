//! # contract: seams between the deployer and the outside world
//!
//! Two traits live here:
//! - [`CommandRunner`] runs a single external program with a timeout. The Tokio
//!   implementation lives in [`crate::runner`]; tests use `MockCommandRunner`.
//! - [`PublishingBackend`] probes and publishes. [`crate::backend`] provides the
//!   real PinMe CLI backend and the simulated one.
//!
//! Both traits are annotated for `mockall` and exported behind the
//! `test-export-mocks` feature so integration tests can build deterministic mocks.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{DeployError, RunError};

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// The first argument, i.e. the tool subcommand.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

/// Captured result of a completed invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout followed by stderr, verbatim.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion or until its timeout expires.
    ///
    /// A non-zero exit is not an error here; it is reported through
    /// [`CommandOutput::success`].
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput, RunError>;
}

/// Which publishing path a deployment takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    Real,
    Simulated,
}

impl DeployMode {
    /// Interpret a mode flag value. Unknown values select real mode.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "mock" | "simulate" | "simulated") => {
                DeployMode::Simulated
            }
            _ => DeployMode::Real,
        }
    }
}

/// What a backend hands back after a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub content_id: Option<String>,
    pub primary_url: String,
    pub raw_upload_output: String,
    pub raw_list_output: String,
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PublishingBackend: Send + Sync {
    fn mode(&self) -> DeployMode;

    /// Whether the backend can publish in the current environment.
    async fn probe(&self) -> bool;

    /// Publish the document at `source`. The path has already been validated.
    async fn publish(&self, source: &Path) -> Result<Publication, DeployError>;
}
