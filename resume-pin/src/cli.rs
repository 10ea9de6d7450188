//! Command-line surface for resume-pin.
//!
//! This module is CLI glue only: argument parsing, building a [`Deployer`] from
//! the loaded configuration, and printing JSON. The deployment logic lives in
//! `resume-pin-core`.
//!
//! Every command prints a single JSON document on stdout; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use resume_pin_core::deploy::{ContentRequest, DeployResponse, Deployer, DeploymentRequest};
use resume_pin_core::history::HistoryLedger;
use resume_pin_core::runner::TokioCommandRunner;
use resume_pin_core::templates;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::load_config::load_config;

/// CLI for resume-pin: publish rendered résumés to IPFS via PinMe.
#[derive(Parser)]
#[clap(
    name = "resume-pin",
    version,
    about = "Publish rendered HTML résumés to IPFS through the PinMe CLI"
)]
pub struct Cli {
    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report whether the PinMe CLI can be called
    Status,
    /// Deploy one or more rendered HTML files
    Deploy {
        /// Files to publish
        #[clap(required = true)]
        paths: Vec<PathBuf>,
        /// Display title recorded in the history
        #[clap(long)]
        title: Option<String>,
        /// Presentation template id
        #[clap(long)]
        template: Option<String>,
        /// Target file name recorded in the result
        #[clap(long)]
        file_name: Option<String>,
    },
    /// Publish the content of an HTML file through a staged temporary copy
    Publish {
        /// HTML file whose content is published
        #[clap(long)]
        html: PathBuf,
        #[clap(long)]
        file_name: Option<String>,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        template: Option<String>,
    },
    /// List the available presentation templates
    Templates,
}

#[derive(Serialize)]
struct DeployReport<'a> {
    deployments: Vec<DeployResponse>,
    history: Vec<resume_pin_core::history::HistoryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a templates::Template>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn check_template(template: Option<&str>) -> Result<Option<&'static templates::Template>> {
    match template {
        None => Ok(None),
        Some(id) => match templates::find(id) {
            Some(t) => Ok(Some(t)),
            None => {
                tracing::error!(template = %id, "Unknown template id");
                anyhow::bail!("Unknown template id: {id}")
            }
        },
    }
}

/// Async CLI entrypoint, shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let ledger = Arc::new(HistoryLedger::new(config.history_capacity));
    let deployer = Deployer::new(&config, Arc::new(TokioCommandRunner::new()), ledger);

    match cli.command {
        Commands::Status => {
            tracing::info!(command = "status", "Checking PinMe availability");
            print_json(&deployer.availability().await)
        }
        Commands::Templates => print_json(&serde_json::json!({
            "success": true,
            "templates": templates::catalog(),
        })),
        Commands::Deploy {
            paths,
            title,
            template,
            file_name,
        } => {
            let template_info = check_template(template.as_deref())?;
            tracing::info!(command = "deploy", count = paths.len(), "Starting deployments");
            let requests = paths.into_iter().map(|path| DeploymentRequest {
                source_path: path,
                title: title.clone(),
                template_id: template.clone(),
                file_name: file_name.clone(),
            });
            let outcomes = join_all(requests.map(|req| deployer.deploy(req))).await;
            finish(&deployer, outcomes, template_info)
        }
        Commands::Publish {
            html,
            file_name,
            title,
            template,
        } => {
            let template_info = check_template(template.as_deref())?;
            let content = tokio::fs::read_to_string(&html).await.map_err(|e| {
                tracing::error!(error = ?e, path = %html.display(), "Failed to read HTML input");
                anyhow::anyhow!("Failed to read {}: {e}", html.display())
            })?;
            if content.trim().is_empty() {
                anyhow::bail!("HTML content is empty: {}", html.display());
            }
            let file_name = file_name.or_else(|| {
                html.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            });
            tracing::info!(command = "publish", path = %html.display(), "Publishing staged content");
            let outcome = deployer
                .deploy_content(ContentRequest {
                    content,
                    file_name,
                    title,
                    template_id: template,
                })
                .await;
            finish(&deployer, vec![outcome], template_info)
        }
    }
}

fn finish(
    deployer: &Deployer,
    outcomes: Vec<Result<resume_pin_core::DeploymentResult, resume_pin_core::DeployError>>,
    template: Option<&templates::Template>,
) -> Result<()> {
    let total = outcomes.len();
    let deployments: Vec<DeployResponse> = outcomes.into_iter().map(DeployResponse::from).collect();
    let failed = deployments.iter().filter(|d| !d.success).count();
    print_json(&DeployReport {
        deployments,
        history: deployer.ledger().list(),
        template,
    })?;
    if failed > 0 {
        tracing::error!(failed, total, "Some deployments failed");
        anyhow::bail!("{failed} of {total} deployments failed");
    }
    tracing::info!(total, "All deployments succeeded");
    Ok(())
}
