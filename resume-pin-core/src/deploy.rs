//! Deployment driver: probe → validate → publish → assemble → record.
//!
//! [`Deployer`] owns one backend per [`DeployMode`]. The mode is resolved once
//! at the start of each call through its [`ModeSelector`]; after that only the
//! chosen backend is used, so a failing real deployment never turns into a
//! simulated one. Nothing is retried: a repeated upload to a content-addressed
//! store may mint a new identifier, so retry is left to the caller.
//!
//! Successful deployments are folded into the shared [`HistoryLedger`]; failed
//! ones are only reported.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::{PinmeCliBackend, SimulatedBackend};
use crate::config::DeployerConfig;
use crate::contract::{CommandRunner, DeployMode, PublishingBackend};
use crate::error::{DeployError, ErrorKind, InstallGuide, Step};
use crate::gateway::GatewaySet;
use crate::history::{HistoryLedger, NewHistoryEntry};
use crate::staging::StagedDocument;

/// Content id reported when the tool output did not include one.
pub const UNKNOWN_CONTENT_ID: &str = "unknown";

/// A document already on local storage, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub source_path: PathBuf,
    pub title: Option<String>,
    pub template_id: Option<String>,
    pub file_name: Option<String>,
}

impl DeploymentRequest {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            title: None,
            template_id: None,
            file_name: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Rendered HTML held in memory; staged to disk only for the publish attempt.
#[derive(Debug, Clone, Default)]
pub struct ContentRequest {
    pub content: String,
    pub file_name: Option<String>,
    pub title: Option<String>,
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub content_id: String,
    pub primary_url: String,
    pub mirror_urls: Vec<String>,
    pub file_name: String,
    pub mode: DeployMode,
    pub raw_upload_output: String,
    pub raw_list_output: String,
    pub deployed_at: DateTime<Utc>,
}

/// Decides the deployment mode for each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSelector {
    /// Read the named environment variable on every call.
    Env(String),
    Fixed(DeployMode),
}

impl ModeSelector {
    pub fn resolve(&self) -> DeployMode {
        match self {
            ModeSelector::Env(var) => DeployMode::from_flag(std::env::var(var).ok().as_deref()),
            ModeSelector::Fixed(mode) => *mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub installed: bool,
    pub mode: DeployMode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_guide: Option<InstallGuide>,
}

/// Raw tool output kept for failed deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_output: Option<String>,
}

/// `{success: true, result}` or `{success: false, error, classification, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DeploymentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_guide: Option<InstallGuide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl From<Result<DeploymentResult, DeployError>> for DeployResponse {
    fn from(outcome: Result<DeploymentResult, DeployError>) -> Self {
        match outcome {
            Ok(result) => DeployResponse {
                success: true,
                result: Some(result),
                error: None,
                classification: None,
                install_guide: None,
                diagnostics: None,
            },
            Err(err) => {
                let diagnostics = match &err {
                    DeployError::ParseFailure {
                        upload_output,
                        list_output,
                    } => Some(Diagnostics {
                        step: None,
                        upload_output: Some(upload_output.clone()),
                        list_output: Some(list_output.clone()),
                    }),
                    DeployError::NetworkUnreachable { step, output } => Some(Diagnostics {
                        step: Some(*step),
                        upload_output: (*step == Step::Upload).then(|| output.clone()),
                        list_output: (*step == Step::List).then(|| output.clone()),
                    }),
                    DeployError::Timeout { step, .. } | DeployError::Invocation { step, .. } => {
                        Some(Diagnostics {
                            step: Some(*step),
                            ..Default::default()
                        })
                    }
                    _ => None,
                };
                DeployResponse {
                    success: false,
                    result: None,
                    error: Some(err.to_string()),
                    classification: Some(err.kind()),
                    install_guide: err.install_guide().cloned(),
                    diagnostics,
                }
            }
        }
    }
}

pub struct Deployer {
    real: Arc<dyn PublishingBackend>,
    simulated: Arc<dyn PublishingBackend>,
    selector: ModeSelector,
    gateways: GatewaySet,
    ledger: Arc<HistoryLedger>,
    staging_dir: PathBuf,
    program: String,
}

impl Deployer {
    /// Build both backends from `config`, driving the real one through `runner`.
    pub fn new(
        config: &DeployerConfig,
        runner: Arc<dyn CommandRunner>,
        ledger: Arc<HistoryLedger>,
    ) -> Self {
        config.trace_loaded();
        Self {
            real: Arc::new(PinmeCliBackend::new(
                runner,
                config.tool.clone(),
                config.settle_delay(),
            )),
            simulated: Arc::new(SimulatedBackend::new(config.settle_delay())),
            selector: ModeSelector::Env(config.mode_env_var.clone()),
            gateways: config.gateways.clone(),
            ledger,
            staging_dir: config.staging_dir.clone(),
            program: config.tool.program.clone(),
        }
    }

    pub fn with_mode_selector(mut self, selector: ModeSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Replace the backends, e.g. with mocks.
    pub fn with_backends(
        mut self,
        real: Arc<dyn PublishingBackend>,
        simulated: Arc<dyn PublishingBackend>,
    ) -> Self {
        self.real = real;
        self.simulated = simulated;
        self
    }

    pub fn ledger(&self) -> &Arc<HistoryLedger> {
        &self.ledger
    }

    pub fn gateways(&self) -> &GatewaySet {
        &self.gateways
    }

    fn backend_for(&self, mode: DeployMode) -> &Arc<dyn PublishingBackend> {
        match mode {
            DeployMode::Real => &self.real,
            DeployMode::Simulated => &self.simulated,
        }
    }

    fn not_installed(&self) -> DeployError {
        DeployError::ToolNotInstalled {
            guide: InstallGuide::for_tool(&self.program),
        }
    }

    pub async fn availability(&self) -> Availability {
        let mode = self.selector.resolve();
        let installed = self.backend_for(mode).probe().await;
        let message = match (mode, installed) {
            (DeployMode::Simulated, _) => {
                "Simulated mode: deployments do not contact PinMe".to_string()
            }
            (DeployMode::Real, true) => "PinMe CLI is installed".to_string(),
            (DeployMode::Real, false) => "PinMe CLI is not installed".to_string(),
        };
        Availability {
            installed,
            mode,
            message,
            install_guide: (!installed).then(|| InstallGuide::for_tool(&self.program)),
        }
    }

    /// Publish the document at `request.source_path`.
    #[tracing::instrument(skip(self, request), fields(path = %request.source_path.display()))]
    pub async fn deploy(&self, request: DeploymentRequest) -> Result<DeploymentResult, DeployError> {
        let outcome = self.run_deploy(&request).await;
        if let Err(e) = &outcome {
            error!(kind = ?e.kind(), error = %e, "[DEPLOY] Deployment failed");
        }
        outcome
    }

    async fn run_deploy(&self, request: &DeploymentRequest) -> Result<DeploymentResult, DeployError> {
        let mode = self.selector.resolve();
        let backend = self.backend_for(mode);
        info!(?mode, "[DEPLOY] Starting deployment");

        if !backend.probe().await {
            warn!("[DEPLOY] Publishing tool unavailable, aborting before upload");
            return Err(self.not_installed());
        }

        validate_source(&request.source_path).await?;

        let publication = backend.publish(&request.source_path).await?;

        let mirror_urls = publication
            .content_id
            .as_deref()
            .map(|cid| self.gateways.mirror_urls(cid))
            .unwrap_or_default();
        let file_name = request
            .file_name
            .clone()
            .or_else(|| {
                request
                    .source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_default();

        let result = DeploymentResult {
            content_id: publication
                .content_id
                .unwrap_or_else(|| UNKNOWN_CONTENT_ID.to_string()),
            primary_url: publication.primary_url,
            mirror_urls,
            file_name,
            mode,
            raw_upload_output: publication.raw_upload_output,
            raw_list_output: publication.raw_list_output,
            deployed_at: Utc::now(),
        };

        self.ledger.record(NewHistoryEntry {
            title: request.title.clone(),
            file_name: result.file_name.clone(),
            content_id: result.content_id.clone(),
            primary_url: result.primary_url.clone(),
            mirror_urls: result.mirror_urls.clone(),
            template_id: request.template_id.clone(),
            deployed_at: result.deployed_at,
        });

        info!(
            content_id = %result.content_id,
            url = %result.primary_url,
            mirrors = result.mirror_urls.len(),
            "[DEPLOY] Deployment succeeded"
        );
        Ok(result)
    }

    /// Stage `request.content` in a fresh temporary directory, publish it and
    /// remove the staged copy whatever the outcome.
    pub async fn deploy_content(
        &self,
        request: ContentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        let staged = StagedDocument::create(
            &self.staging_dir,
            request.file_name.as_deref(),
            &request.content,
        )
        .await
        .map_err(|e| {
            error!(error = ?e, dir = %self.staging_dir.display(), "[STAGE] Could not stage document");
            DeployError::Invocation {
                step: Step::Upload,
                detail: format!("could not stage document: {e}"),
            }
        })?;

        let deploy_request = DeploymentRequest {
            source_path: staged.path().to_path_buf(),
            title: request.title,
            template_id: request.template_id,
            file_name: Some(staged.file_name().to_string()),
        };
        let outcome = self.deploy(deploy_request).await;
        staged.remove().await;
        outcome
    }
}

async fn validate_source(path: &Path) -> Result<(), DeployError> {
    let not_found = || DeployError::SourceNotFound {
        path: path.to_path_buf(),
    };
    // The path is handed to the tool as a UTF-8 argument.
    if path.to_str().is_none() {
        warn!(path = ?path, "[DEPLOY] Source path is not valid UTF-8");
        return Err(not_found());
    }
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        warn!(error = ?e, path = %path.display(), "[DEPLOY] Source document not readable");
        not_found()
    })?;
    let metadata = file.metadata().await.map_err(|_| not_found())?;
    if !metadata.is_file() {
        warn!(path = %path.display(), "[DEPLOY] Source is not a regular file");
        return Err(not_found());
    }
    Ok(())
}
