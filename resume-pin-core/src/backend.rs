//! Publishing backends: the real PinMe CLI driver and the simulated one.
//!
//! [`PinmeCliBackend`] runs `upload`, waits for the network to settle, runs
//! `list -l 1` and parses the text. [`SimulatedBackend`] mints a plausible
//! identifier without touching the tool, but keeps the settling delay so
//! callers observe the same latency.

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ToolConfig;
use crate::contract::{CommandRunner, DeployMode, Invocation, Publication, PublishingBackend};
use crate::error::{DeployError, InstallGuide, RunError, Step};
use crate::gateway::access_url;
use crate::parser::parse_outputs;
use crate::prober::CliProber;

/// Substrings in tool output that indicate the network could not be reached.
pub const NETWORK_FAILURE_MARKERS: &[&str] = &[
    "enotfound",
    "econnrefused",
    "econnreset",
    "etimedout",
    "eai_again",
    "getaddrinfo",
    "network is unreachable",
    "socket hang up",
    "fetch failed",
];

pub fn looks_like_network_failure(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    NETWORK_FAILURE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Number of entries requested from `list`.
const LIST_LIMIT: &str = "1";

pub struct PinmeCliBackend {
    runner: Arc<dyn CommandRunner>,
    prober: CliProber,
    tool: ToolConfig,
    settle_delay: Duration,
}

impl PinmeCliBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, tool: ToolConfig, settle_delay: Duration) -> Self {
        let prober = CliProber::new(runner.clone(), tool.program.clone(), tool.version_timeout());
        Self {
            runner,
            prober,
            tool,
            settle_delay,
        }
    }

    /// Run one subcommand and return its combined output, classifying failures.
    async fn invoke(
        &self,
        step: Step,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<String, DeployError> {
        let invocation = Invocation::new(&self.tool.program, args, timeout);
        let output = match self.runner.run(invocation).await {
            Ok(output) => output,
            Err(RunError::NotFound(program)) => {
                error!(%program, %step, "[DEPLOY] CLI disappeared before invocation");
                return Err(DeployError::ToolNotInstalled {
                    guide: InstallGuide::for_tool(&program),
                });
            }
            Err(RunError::TimedOut(after)) => {
                error!(%step, ?after, "[DEPLOY] Invocation timed out");
                return Err(DeployError::Timeout { step, after });
            }
            Err(RunError::Io(e)) => {
                error!(%step, error = ?e, "[DEPLOY] Invocation failed");
                return Err(DeployError::Invocation {
                    step,
                    detail: e.to_string(),
                });
            }
        };

        let combined = output.combined();
        if output.success {
            return Ok(combined);
        }
        if looks_like_network_failure(&combined) {
            error!(%step, code = ?output.code, "[DEPLOY] Publishing network unreachable");
            return Err(DeployError::NetworkUnreachable {
                step,
                output: combined,
            });
        }
        error!(%step, code = ?output.code, "[DEPLOY] CLI exited with non-zero status");
        Err(DeployError::Invocation {
            step,
            detail: match output.code {
                Some(code) => format!("exit code {code}: {}", combined.trim()),
                None => format!("terminated by signal: {}", combined.trim()),
            },
        })
    }
}

#[async_trait]
impl PublishingBackend for PinmeCliBackend {
    fn mode(&self) -> DeployMode {
        DeployMode::Real
    }

    async fn probe(&self) -> bool {
        self.prober.probe().await
    }

    async fn publish(&self, source: &Path) -> Result<Publication, DeployError> {
        let Some(path) = source.to_str().map(str::to_string) else {
            error!(path = ?source, "[DEPLOY] Source path is not valid UTF-8");
            return Err(DeployError::SourceNotFound {
                path: source.to_path_buf(),
            });
        };

        info!(path = %path, "[DEPLOY] Uploading with PinMe CLI");
        let upload_output = self
            .invoke(
                Step::Upload,
                vec!["upload".to_string(), path.clone()],
                self.tool.upload_timeout(),
            )
            .await?;

        info!(delay_ms = self.settle_delay.as_millis() as u64, "[DEPLOY] Waiting for upload to settle");
        tokio::time::sleep(self.settle_delay).await;

        let list_output = self
            .invoke(
                Step::List,
                vec!["list".to_string(), "-l".to_string(), LIST_LIMIT.to_string()],
                self.tool.list_timeout(),
            )
            .await?;

        let parsed = parse_outputs(&list_output, &upload_output);
        match parsed.url {
            Some(primary_url) => {
                info!(
                    url = %primary_url,
                    content_id = parsed.content_id.as_deref().unwrap_or("unknown"),
                    "[DEPLOY] Recovered access URL"
                );
                Ok(Publication {
                    content_id: parsed.content_id,
                    primary_url,
                    raw_upload_output: upload_output,
                    raw_list_output: list_output,
                })
            }
            None => {
                warn!(path = %path, "[DEPLOY] No access URL found in CLI output");
                Err(DeployError::ParseFailure {
                    upload_output,
                    list_output,
                })
            }
        }
    }
}

/// Prefix of simulated identifiers, mimicking CIDv1 base32 dag-pb ids.
pub const SIMULATED_CID_PREFIX: &str = "bafybei";
const BASE32_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Timestamp digits first, then random ones, all from the base32 alphabet.
pub fn synthesize_content_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let random = Uuid::new_v4();
    let mut id = String::with_capacity(59);
    id.push_str(SIMULATED_CID_PREFIX);
    for shift in (0..13).rev() {
        id.push(BASE32_ALPHABET[((millis >> (shift * 5)) & 31) as usize] as char);
    }
    for byte in random.as_bytes() {
        id.push(BASE32_ALPHABET[(byte & 31) as usize] as char);
        id.push(BASE32_ALPHABET[(byte >> 3) as usize] as char);
    }
    id
}

/// Access URL for a simulated identifier: the identifier itself is the
/// subdomain label, so the URL always names the content it claims to serve.
pub fn simulated_access_url(content_id: &str) -> String {
    access_url(&content_id.to_ascii_lowercase())
}

pub struct SimulatedBackend {
    settle_delay: Duration,
}

impl SimulatedBackend {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }
}

#[async_trait]
impl PublishingBackend for SimulatedBackend {
    fn mode(&self) -> DeployMode {
        DeployMode::Simulated
    }

    async fn probe(&self) -> bool {
        info!("[PROBE] Simulated mode, CLI check skipped");
        true
    }

    async fn publish(&self, source: &Path) -> Result<Publication, DeployError> {
        let content_id = synthesize_content_id();
        let primary_url = simulated_access_url(&content_id);
        info!(
            path = %source.display(),
            content_id = %content_id,
            "[DEPLOY] Simulating publish"
        );
        tokio::time::sleep(self.settle_delay).await;

        Ok(Publication {
            raw_upload_output: format!(
                "[simulated] upload of {} skipped\nIPFS CID: {content_id}\nENS URL: {primary_url}\n",
                source.display()
            ),
            raw_list_output: String::new(),
            content_id: Some(content_id),
            primary_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, CID_PREFIX};

    #[test]
    fn simulated_ids_look_like_cids() {
        let a = synthesize_content_id();
        let b = synthesize_content_id();
        assert!(a.starts_with(CID_PREFIX));
        assert_eq!(a.len(), SIMULATED_CID_PREFIX.len() + 13 + 32);
        assert!(a.bytes().all(|c| BASE32_ALPHABET.contains(&c)));
        assert_ne!(a, b);
    }

    #[test]
    fn network_markers_are_case_insensitive() {
        assert!(looks_like_network_failure("Error: getaddrinfo ENOTFOUND api.pinme.io"));
        assert!(looks_like_network_failure("request to x failed, reason: connect ECONNREFUSED"));
        assert!(!looks_like_network_failure("Error: file too large"));
    }

    #[tokio::test]
    async fn simulated_output_is_parseable() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        let publication = backend.publish(Path::new("/tmp/r.html")).await.unwrap();
        let parsed = parse(&publication.raw_upload_output);
        assert_eq!(parsed.content_id, publication.content_id);
        assert_eq!(parsed.url.as_deref(), Some(publication.primary_url.as_str()));
    }

    #[tokio::test]
    async fn simulated_url_is_derived_from_the_identifier() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        let first = backend.publish(Path::new("/tmp/a.html")).await.unwrap();
        let second = backend.publish(Path::new("/tmp/b.html")).await.unwrap();

        for publication in [&first, &second] {
            let cid = publication.content_id.as_deref().unwrap();
            assert_eq!(publication.primary_url, simulated_access_url(cid));
            assert!(publication.primary_url.contains(&cid[..10]));
            assert!(publication.primary_url.contains(&cid[cid.len() - 10..]));
        }
        assert_ne!(first.primary_url, second.primary_url);
    }
}
