//! Environment-driven pipeline configuration.

use std::time::Duration;

use tracing::warn;

/// Default backend endpoint for local development.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8188";
/// Default per-generation wall-clock budget.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default delay between history polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
/// Default artifact substituted on failure.
pub const DEFAULT_PLACEHOLDER: &str = "/static/images/placeholder_action.jpg";

/// Runtime settings for the generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// ComfyUI endpoint (host or full URL).
    pub endpoint: String,
    /// Wall-clock budget per generation.
    pub generation_timeout: Duration,
    /// Delay between history polls.
    pub poll_interval: Duration,
    /// Artifact substituted when a generation fails.
    pub placeholder_artifact: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            generation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            placeholder_artifact: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the environment, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// Recognized variables: `COMFYUI_URL`, `GENERATION_TIMEOUT_SECS`,
    /// `GENERATION_POLL_INTERVAL_MS`, `PLACEHOLDER_ARTIFACT`.
    pub fn from_env() -> Self {
        Self {
            endpoint: env_string("COMFYUI_URL", DEFAULT_ENDPOINT),
            generation_timeout: Duration::from_secs(env_parse(
                "GENERATION_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
            poll_interval: Duration::from_millis(env_parse(
                "GENERATION_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            placeholder_artifact: env_string("PLACEHOLDER_ARTIFACT", DEFAULT_PLACEHOLDER),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Unparsable environment value, using default");
            default
        }),
        Err(_) => default,
    }
}
