//! Scene generation pipeline.
//!
//! Orchestrates one generation end to end: validate the request,
//! enhance the prompt, discover and select a checkpoint, build the
//! workflow graph, then submit and wait. Construction problems
//! (invalid request, empty catalog, graph assembly) are raised as
//! [`PipelineError`]; runtime failures stay embedded in the returned
//! [`GenerationResult`].

pub mod config;

pub use config::PipelineConfig;

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use cina_comfyui::{
    build_workflow, select_model, ClientOptions, ComfyUIClient, GenerationResult, GraphError,
    NoModelAvailable,
};
use cina_core::request::GenerationRequest;
use cina_core::{prompt, CoreError};

/// Errors raised before a generation reaches the backend.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRequest(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    NoModel(#[from] NoModelAvailable),
}

/// One-backend generation pipeline.
pub struct ScenePipeline {
    client: ComfyUIClient,
    timeout: Duration,
}

impl ScenePipeline {
    /// Build a pipeline from configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        let client = ComfyUIClient::with_options(
            &config.endpoint,
            ClientOptions {
                poll_interval: config.poll_interval,
                placeholder_artifact: config.placeholder_artifact.clone(),
                ..ClientOptions::default()
            },
        );
        Self {
            client,
            timeout: config.generation_timeout,
        }
    }

    /// Build a pipeline around an existing client.
    pub fn with_client(client: ComfyUIClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Probe the backend for liveness.
    pub async fn health_check(&self) -> bool {
        self.client.health_check().await
    }

    /// Run one generation end to end.
    ///
    /// A missing request seed is resolved here, before graph assembly,
    /// so the built graph itself is deterministic and the seed can be
    /// stamped into the result metadata.
    pub async fn generate_scene(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, PipelineError> {
        request.validate()?;

        let scene_type = request.scene.scene_type;
        let span = info_span!("generate_scene", scene_type = %scene_type);

        async {
            let prompts = prompt::enhance_with_negative_base(
                &request.prompt,
                &request.scene,
                request.config.negative_prompt.as_deref(),
            );

            let catalog = self.client.list_models().await;
            let model = select_model(
                &catalog,
                scene_type,
                request.config.preferred_model.as_deref(),
            )?;
            info!(model = %model, catalog_size = catalog.len(), "Selected checkpoint");

            let seed = request
                .config
                .seed
                .unwrap_or_else(|| rand::rng().random_range(0..i64::MAX));

            let graph = build_workflow(request, &model, &prompts, seed)?;

            let mut result = self.client.submit_and_wait(&graph, self.timeout, cancel).await;

            result
                .metadata
                .insert("enhanced_prompt".to_string(), prompts.positive.into());
            result
                .metadata
                .insert("scene_type".to_string(), scene_type.as_str().into());
            result.metadata.insert(
                "violence_level".to_string(),
                request.scene.violence_level.as_str().into(),
            );
            result.metadata.insert("model_used".to_string(), model.into());
            result.metadata.insert("seed".to_string(), seed.into());

            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Run a batch of generations concurrently.
    ///
    /// Fails fast on construction errors; otherwise yields one result
    /// per request, in request order.
    pub async fn generate_batch(
        &self,
        requests: &[GenerationRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<GenerationResult>, PipelineError> {
        let attempts = requests.iter().map(|r| self.generate_scene(r, cancel));
        futures::future::try_join_all(attempts).await
    }
}
