//! Submit-and-poll execution client.
//!
//! Drives a built workflow through the backend: queue via `/prompt`,
//! poll `/history/{id}` until the terminal save node reports output,
//! and resolve every attempt into a [`GenerationResult`]. Runtime
//! failures (rejection, timeout, remote error, cancellation) are
//! embedded in the result with a placeholder artifact, never raised.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::error::GenerationFailure;
use crate::graph::WorkflowGraph;
use crate::models::{parse_catalog, ModelCatalog};
use crate::result::GenerationResult;

/// Tunables for the execution client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Delay between history polls.
    pub poll_interval: Duration,
    /// Timeout for the health and discovery probes.
    pub probe_timeout: Duration,
    /// Artifact substituted when an attempt fails.
    pub placeholder_artifact: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(10),
            placeholder_artifact: "/static/images/placeholder_action.jpg".to_string(),
        }
    }
}

/// Execution client bound to one ComfyUI instance.
pub struct ComfyUIClient {
    api: ComfyUIApi,
    options: ClientOptions,
}

impl ComfyUIClient {
    pub fn new(endpoint: &str) -> Self {
        Self::with_options(endpoint, ClientOptions::default())
    }

    pub fn with_options(endpoint: &str, options: ClientOptions) -> Self {
        Self {
            api: ComfyUIApi::new(endpoint),
            options,
        }
    }

    /// Base URL of the bound instance.
    pub fn endpoint(&self) -> &str {
        self.api.api_url()
    }

    /// Probe the instance for liveness.
    ///
    /// Never raises: any probe failure reads as "not healthy".
    pub async fn health_check(&self) -> bool {
        match self.api.get_system_stats(self.options.probe_timeout).await {
            Ok(_) => true,
            Err(e) => {
                debug!(endpoint = %self.api.api_url(), error = %e, "Health probe failed");
                false
            }
        }
    }

    /// Discover the checkpoint models installed on the instance.
    ///
    /// Never raises: discovery failure yields an empty catalog, which
    /// callers treat as "no models available".
    pub async fn list_models(&self) -> ModelCatalog {
        match self.api.get_object_info(self.options.probe_timeout).await {
            Ok(info) => {
                let catalog = parse_catalog(&info);
                debug!(count = catalog.len(), "Discovered checkpoint models");
                catalog
            }
            Err(e) => {
                warn!(endpoint = %self.api.api_url(), error = %e, "Model discovery failed");
                ModelCatalog::empty()
            }
        }
    }

    /// Submit a workflow and poll until it resolves.
    ///
    /// Resolution is success (terminal save node produced output), a
    /// remote failure report, the `timeout` budget elapsing, or
    /// `cancel` firing. Transient polling errors are logged and
    /// retried until the budget runs out.
    pub async fn submit_and_wait(
        &self,
        graph: &WorkflowGraph,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let started_at = Utc::now();
        let start = Instant::now();

        let save_node = match graph.terminal_save_node() {
            Some(id) => id.as_u32().to_string(),
            None => {
                return self.failed(
                    GenerationFailure::SubmissionRejected {
                        status: None,
                        detail: "workflow has no terminal save node".to_string(),
                    },
                    None,
                    started_at,
                    start,
                );
            }
        };

        let client_id = uuid::Uuid::new_v4().to_string();
        let submission = self
            .api
            .submit_workflow(
                &graph.to_api_json(),
                &client_id,
                self.request_timeout(timeout, start),
            )
            .await;

        let prompt_id = match submission {
            Ok(response) => {
                info!(
                    prompt_id = %response.prompt_id,
                    queue_position = response.number,
                    "Workflow queued"
                );
                response.prompt_id
            }
            Err(e) => {
                warn!(error = %e, "Workflow submission failed");
                return self.failed(
                    GenerationFailure::SubmissionRejected {
                        status: e.status(),
                        detail: submission_detail(&e),
                    },
                    None,
                    started_at,
                    start,
                );
            }
        };

        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so the backend has
        // one poll interval to register the job.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.abort_remote(&prompt_id).await;
                    return self.failed(
                        GenerationFailure::Cancelled,
                        Some(prompt_id),
                        started_at,
                        start,
                    );
                }
                _ = ticker.tick() => {}
            }

            if start.elapsed() >= timeout {
                warn!(prompt_id = %prompt_id, elapsed_secs = start.elapsed().as_secs(), "Generation timed out");
                return self.failed(
                    GenerationFailure::TimedOut {
                        elapsed_secs: start.elapsed().as_secs(),
                    },
                    Some(prompt_id),
                    started_at,
                    start,
                );
            }

            // Each poll is bounded by the remaining budget and raced
            // against cancellation; an accepted-but-silent connection
            // must not stall the wait.
            let poll = self
                .api
                .get_history(&prompt_id, self.request_timeout(timeout, start));
            let history = tokio::select! {
                _ = cancel.cancelled() => {
                    self.abort_remote(&prompt_id).await;
                    return self.failed(
                        GenerationFailure::Cancelled,
                        Some(prompt_id.clone()),
                        started_at,
                        start,
                    );
                }
                result = poll => match result {
                    Ok(history) => history,
                    Err(e) => {
                        // Pods briefly 502 while busy; retry within budget.
                        warn!(prompt_id = %prompt_id, error = %e, "History poll failed, retrying");
                        continue;
                    }
                }
            };

            if let Some(message) = history_error(&history, &prompt_id) {
                warn!(prompt_id = %prompt_id, message = %message, "Remote execution failed");
                return self.failed(
                    GenerationFailure::RemoteJobFailed { message },
                    Some(prompt_id),
                    started_at,
                    start,
                );
            }

            if let Some(filename) = extract_output_filename(&history, &prompt_id, &save_node) {
                let elapsed = start.elapsed().as_secs_f64();
                info!(prompt_id = %prompt_id, filename = %filename, generation_secs = elapsed, "Generation complete");
                return GenerationResult {
                    artifact: self.artifact_url(&filename),
                    prompt_id: Some(prompt_id),
                    generation_secs: elapsed,
                    started_at,
                    error: None,
                    metadata: serde_json::Map::new(),
                };
            }
        }
    }

    // ---- private helpers ----

    /// Best-effort remote cleanup after local cancellation.
    async fn abort_remote(&self, prompt_id: &str) {
        if let Err(e) = self.api.cancel_execution(prompt_id).await {
            debug!(prompt_id = %prompt_id, error = %e, "Queue delete after cancel failed");
        }
        if let Err(e) = self.api.interrupt().await {
            debug!(prompt_id = %prompt_id, error = %e, "Interrupt after cancel failed");
        }
    }

    fn failed(
        &self,
        failure: GenerationFailure,
        prompt_id: Option<String>,
        started_at: chrono::DateTime<Utc>,
        start: Instant,
    ) -> GenerationResult {
        GenerationResult {
            artifact: self.options.placeholder_artifact.clone(),
            prompt_id,
            generation_secs: start.elapsed().as_secs_f64(),
            started_at,
            error: Some(failure),
            metadata: serde_json::Map::new(),
        }
    }

    /// Per-request bound: the probe timeout, clipped to the remaining
    /// wall-clock budget, with a small floor.
    fn request_timeout(&self, timeout: Duration, start: Instant) -> Duration {
        let remaining = timeout.saturating_sub(start.elapsed());
        self.options
            .probe_timeout
            .min(remaining)
            .max(Duration::from_millis(10))
    }

    /// Absolute `/view` URL for an output file. The filename is a
    /// query value and gets percent-encoded.
    fn artifact_url(&self, filename: &str) -> String {
        match reqwest::Url::parse(&format!("{}/view", self.api.api_url())) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("filename", filename)
                    .append_pair("type", "output");
                url.to_string()
            }
            Err(_) => format!(
                "{}/view?filename={}&type=output",
                self.api.api_url(),
                filename
            ),
        }
    }
}

/// Human-readable detail for a failed submission.
fn submission_detail(error: &ComfyUIApiError) -> String {
    match error {
        ComfyUIApiError::ApiError { body, .. } => body.clone(),
        ComfyUIApiError::Request(e) => e.to_string(),
    }
}

/// Pull the first output filename for the terminal save node out of a
/// history payload.
///
/// History is keyed by prompt id, then `outputs` by node id; output
/// media may arrive as `images`, `gifs`, or `videos` depending on the
/// save node class.
fn extract_output_filename(
    history: &serde_json::Value,
    prompt_id: &str,
    save_node: &str,
) -> Option<String> {
    let outputs = &history[prompt_id]["outputs"][save_node];
    ["images", "gifs", "videos"]
        .iter()
        .filter_map(|key| outputs[key].as_array())
        .flatten()
        .find_map(|entry| entry["filename"].as_str().map(str::to_string))
}

/// Extract a remote failure message from a history payload, if the
/// backend marked the job as failed.
fn history_error(history: &serde_json::Value, prompt_id: &str) -> Option<String> {
    let status = &history[prompt_id]["status"];
    if status["status_str"].as_str() != Some("error") {
        return None;
    }

    let message = status["messages"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|m| m.as_array())
        .filter(|m| m.first().and_then(|k| k.as_str()) == Some("execution_error"))
        .find_map(|m| m.get(1)?.get("exception_message")?.as_str())
        .map(str::to_string);

    Some(message.unwrap_or_else(|| "execution failed".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
