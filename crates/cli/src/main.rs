//! Command-line entry point for one-off scene generations.
//!
//! Usage: `cina <scene_type> <prompt...>`
//!
//! Reads backend configuration from the environment (see
//! [`cina_pipeline::PipelineConfig::from_env`]), runs one generation,
//! and prints the artifact URL or the failure.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cina_core::request::GenerationRequest;
use cina_core::scene::SceneType;
use cina_pipeline::{PipelineConfig, ScenePipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cina=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let scene_type = args
        .next()
        .context("usage: cina <scene_type> <prompt...>")?;
    let scene_type = SceneType::parse(&scene_type)
        .with_context(|| format!("unknown scene type '{scene_type}'"))?;
    let prompt = args.collect::<Vec<_>>().join(" ");
    anyhow::ensure!(!prompt.is_empty(), "usage: cina <scene_type> <prompt...>");

    let config = PipelineConfig::from_env();
    tracing::info!(endpoint = %config.endpoint, "Starting generation");
    let pipeline = ScenePipeline::new(&config);

    // Ctrl-C cancels the in-flight generation instead of killing the
    // process mid-poll.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling generation");
                cancel.cancel();
            }
        });
    }

    let request = GenerationRequest::new(prompt, scene_type);
    let result = pipeline.generate_scene(&request, &cancel).await?;

    match &result.error {
        None => {
            println!("{}", result.artifact);
            println!(
                "model: {}  seed: {}  took: {:.1}s",
                result.metadata["model_used"].as_str().unwrap_or("?"),
                result.metadata["seed"],
                result.generation_secs
            );
            Ok(())
        }
        Some(failure) => {
            eprintln!("generation failed: {failure}");
            eprintln!("placeholder artifact: {}", result.artifact);
            std::process::exit(1);
        }
    }
}
