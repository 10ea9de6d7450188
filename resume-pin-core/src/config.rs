use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::gateway::GatewaySet;

/// Environment variable consulted for the deployment mode unless overridden.
pub const DEFAULT_MODE_ENV_VAR: &str = "RESUME_PIN_MODE";
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// How to reach the PinMe CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub program: String,
    pub version_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub list_timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "pinme".to_string(),
            version_timeout_secs: 10,
            upload_timeout_secs: 60,
            list_timeout_secs: 30,
        }
    }
}

impl ToolConfig {
    pub fn version_timeout(&self) -> Duration {
        Duration::from_secs(self.version_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }
}

/// All tunables of the deployer. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    pub tool: ToolConfig,
    /// Wait between upload and listing, in milliseconds.
    pub settle_delay_ms: u64,
    pub history_capacity: usize,
    /// Parent directory for per-request staging directories.
    pub staging_dir: PathBuf,
    pub mode_env_var: String,
    pub gateways: GatewaySet,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            settle_delay_ms: 2000,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            staging_dir: std::env::temp_dir().join("resume-pin"),
            mode_env_var: DEFAULT_MODE_ENV_VAR.to_string(),
            gateways: GatewaySet::default(),
        }
    }
}

impl DeployerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn trace_loaded(&self) {
        info!(
            program = %self.tool.program,
            settle_delay_ms = self.settle_delay_ms,
            history_capacity = self.history_capacity,
            staging_dir = %self.staging_dir.display(),
            mode_env_var = %self.mode_env_var,
            gateways = self.gateways.templates().len(),
            "Loaded DeployerConfig"
        );
        debug!(?self, "DeployerConfig loaded (full debug)");
    }
}
