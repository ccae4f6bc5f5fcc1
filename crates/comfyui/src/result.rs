//! Outcome record for a generation attempt.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GenerationFailure;

/// Outcome of one generation attempt, successful or not.
///
/// Every submit-and-wait call resolves to one of these; runtime
/// failures land in [`GenerationResult::error`] with a placeholder
/// artifact instead of being raised.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// URL of the produced artifact, or the placeholder on failure.
    pub artifact: String,
    /// Server-assigned prompt id, when submission got that far.
    pub prompt_id: Option<String>,
    /// Wall-clock duration of the attempt in seconds.
    pub generation_secs: f64,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// The failure, if the attempt did not complete.
    pub error: Option<GenerationFailure>,
    /// Free-form context stamped by the pipeline (model, seed, ...).
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable failure description, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_no_error_message() {
        let result = GenerationResult {
            artifact: "http://host/view?filename=out.png&type=output".to_string(),
            prompt_id: Some("abc".to_string()),
            generation_secs: 12.5,
            started_at: Utc::now(),
            error: None,
            metadata: serde_json::Map::new(),
        };
        assert!(result.is_success());
        assert!(result.error_message().is_none());
    }

    #[test]
    fn failure_renders_its_message() {
        let result = GenerationResult {
            artifact: "/static/images/placeholder_action.jpg".to_string(),
            prompt_id: None,
            generation_secs: 0.1,
            started_at: Utc::now(),
            error: Some(GenerationFailure::TimedOut { elapsed_secs: 120 }),
            metadata: serde_json::Map::new(),
        };
        assert!(!result.is_success());
        assert_eq!(
            result.error_message().unwrap(),
            "Generation timed out after 120s"
        );
    }

    #[test]
    fn serializes_error_with_kind_tag() {
        let result = GenerationResult {
            artifact: "/static/images/placeholder_action.jpg".to_string(),
            prompt_id: Some("abc".to_string()),
            generation_secs: 3.0,
            started_at: Utc::now(),
            error: Some(GenerationFailure::RemoteJobFailed {
                message: "OOM".to_string(),
            }),
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"]["kind"], "remote_job_failed");
    }
}
