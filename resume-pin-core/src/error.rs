//! Error taxonomy for the deployment core.
//!
//! Every failure inside the deployer is converted into [`DeployError`] before it
//! leaves the crate. Child-process failures are reported by the runner seam as
//! [`RunError`] and translated by the backend that issued the invocation.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Multi-line guidance shown when the PinMe CLI cannot be found.
pub const INSTALL_GUIDE_MESSAGE: &str = "
Please install the PinMe CLI:
1. Open a terminal
2. Run: npm install -g pinme
3. Verify: pinme --version
4. Retry the deployment
";

/// Structured installation guidance attached to [`DeployError::ToolNotInstalled`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallGuide {
    pub tool: String,
    pub install_command: String,
    pub verify_command: String,
    pub steps: Vec<String>,
    pub message: String,
}

impl InstallGuide {
    /// Guidance for the given tool; a path is reduced to its file name.
    pub fn for_tool(program: &str) -> Self {
        let program = std::path::Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.to_string());
        Self {
            tool: program.to_string(),
            install_command: format!("npm install -g {program}"),
            verify_command: format!("{program} --version"),
            steps: vec![
                "Open a terminal".to_string(),
                format!("Run: npm install -g {program}"),
                format!("Verify: {program} --version"),
                "Retry the deployment".to_string(),
            ],
            message: INSTALL_GUIDE_MESSAGE.to_string(),
        }
    }
}

/// Which external tool invocation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Probe,
    Upload,
    List,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Probe => f.write_str("probe"),
            Step::Upload => f.write_str("upload"),
            Step::List => f.write_str("list"),
        }
    }
}

/// The closed classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ToolNotInstalled,
    SourceNotFound,
    InvocationTimeout,
    NetworkUnreachable,
    ParseFailure,
    UnknownInvocationError,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("PinMe CLI is not available")]
    ToolNotInstalled { guide: InstallGuide },

    #[error("source document not found or unreadable: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("{step} step timed out after {}s", after.as_secs_f64())]
    Timeout { step: Step, after: Duration },

    #[error("{step} step could not reach the publishing network")]
    NetworkUnreachable { step: Step, output: String },

    #[error("could not recover an access URL from the tool output")]
    ParseFailure {
        upload_output: String,
        list_output: String,
    },

    #[error("{step} step failed: {detail}")]
    Invocation { step: Step, detail: String },
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::ToolNotInstalled { .. } => ErrorKind::ToolNotInstalled,
            DeployError::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            DeployError::Timeout { .. } => ErrorKind::InvocationTimeout,
            DeployError::NetworkUnreachable { .. } => ErrorKind::NetworkUnreachable,
            DeployError::ParseFailure { .. } => ErrorKind::ParseFailure,
            DeployError::Invocation { .. } => ErrorKind::UnknownInvocationError,
        }
    }

    pub fn install_guide(&self) -> Option<&InstallGuide> {
        match self {
            DeployError::ToolNotInstalled { guide } => Some(guide),
            _ => None,
        }
    }
}

/// Failure of a single child-process invocation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("program `{0}` was not found")]
    NotFound(String),

    #[error("invocation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}
