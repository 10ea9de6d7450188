use anyhow::{Context, Result};
use resume_pin_core::config::DeployerConfig;
use resume_pin_core::gateway::GatewaySet;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Overrides the tool program from the environment (e.g. a non-global npm install).
pub const PROGRAM_ENV_VAR: &str = "PINME_BIN";
pub const STAGING_DIR_ENV_VAR: &str = "RESUME_PIN_STAGING_DIR";

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    #[serde(default)]
    tool: Option<ToolSection>,
    #[serde(default)]
    deploy: Option<DeploySection>,
    #[serde(default)]
    history: Option<HistorySection>,
    #[serde(default)]
    gateways: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolSection {
    program: Option<String>,
    version_timeout_secs: Option<u64>,
    upload_timeout_secs: Option<u64>,
    list_timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeploySection {
    settle_delay_ms: Option<u64>,
    staging_dir: Option<PathBuf>,
    mode_env_var: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct HistorySection {
    capacity: Option<usize>,
}

/// Builds the deployer configuration: defaults, then the optional YAML file,
/// then environment overrides.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<DeployerConfig> {
    let static_conf = match path {
        Some(path) => read_static_config(path.as_ref())?,
        None => {
            info!("No config file given, using defaults");
            StaticConfig::default()
        }
    };

    let mut config = DeployerConfig::default();

    if let Some(tool) = static_conf.tool {
        if let Some(program) = tool.program {
            config.tool.program = program;
        }
        if let Some(secs) = tool.version_timeout_secs {
            config.tool.version_timeout_secs = secs;
        }
        if let Some(secs) = tool.upload_timeout_secs {
            config.tool.upload_timeout_secs = secs;
        }
        if let Some(secs) = tool.list_timeout_secs {
            config.tool.list_timeout_secs = secs;
        }
    }

    if let Some(deploy) = static_conf.deploy {
        if let Some(ms) = deploy.settle_delay_ms {
            config.settle_delay_ms = ms;
        }
        if let Some(dir) = deploy.staging_dir {
            config.staging_dir = dir;
        }
        if let Some(var) = deploy.mode_env_var {
            if var.trim().is_empty() {
                error!("deploy.mode_env_var must not be empty");
                anyhow::bail!("deploy.mode_env_var must not be empty");
            }
            config.mode_env_var = var;
        }
    }

    if let Some(history) = static_conf.history {
        if let Some(capacity) = history.capacity {
            if capacity == 0 {
                error!("history.capacity must be at least 1");
                anyhow::bail!("history.capacity must be at least 1");
            }
            config.history_capacity = capacity;
        }
    }

    if let Some(templates) = static_conf.gateways {
        config.gateways = GatewaySet::new(templates);
    }

    if let Ok(program) = std::env::var(PROGRAM_ENV_VAR) {
        info!(%program, "{PROGRAM_ENV_VAR} found in env");
        config.tool.program = program;
    }
    if let Ok(dir) = std::env::var(STAGING_DIR_ENV_VAR) {
        info!(%dir, "{STAGING_DIR_ENV_VAR} found in env");
        config.staging_dir = PathBuf::from(dir);
    }

    info!(
        program = %config.tool.program,
        staging_dir = %config.staging_dir.display(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        e
    })
    .with_context(|| format!("Failed to read config file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }

    serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            e
        })
        .context("Failed to parse config YAML")
}
