#![doc = "resume-pin-core: deployment orchestration for publishing résumés via the PinMe CLI."]

//! This crate drives the external `pinme` tool, recovers the content identifier
//! and access URL from its text output, and keeps a bounded in-memory history
//! of successful deployments.
//!
//! # Usage
//! Build a [`deploy::Deployer`] from a [`config::DeployerConfig`], a
//! [`contract::CommandRunner`] (normally [`runner::TokioCommandRunner`]) and a
//! shared [`history::HistoryLedger`], then call `deploy` or `deploy_content`.

pub mod backend;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod gateway;
pub mod history;
pub mod parser;
pub mod prober;
pub mod runner;
pub mod staging;
pub mod templates;

pub use deploy::{ContentRequest, DeployResponse, Deployer, DeploymentRequest, DeploymentResult};
pub use error::{DeployError, ErrorKind};
