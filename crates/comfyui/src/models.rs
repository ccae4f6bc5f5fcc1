//! Checkpoint catalog discovery and model selection.
//!
//! The catalog is parsed out of the backend's `/object_info` response
//! and refreshed per session; rented pods change their installed model
//! set between sessions, so the catalog is never cached long-term.

use cina_core::scene::SceneType;

use crate::error::NoModelAvailable;
use crate::presets::WAN_FAMILY_MARKER;

/// Checkpoint names available on one backend, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    /// Catalog with no entries (discovery failed or empty pod).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

/// Parse the checkpoint enumeration from an `/object_info` response.
///
/// The checkpoint list lives in the `CheckpointLoaderSimple` class
/// schema at `input.ckpt_name[0]`; newer servers nest it under
/// `input.required.ckpt_name[0]`. Both shapes are accepted. Anything
/// unexpected yields an empty catalog, never an error.
pub fn parse_catalog(object_info: &serde_json::Value) -> ModelCatalog {
    let input = &object_info["CheckpointLoaderSimple"]["input"];
    let ckpt_schema = if input["ckpt_name"].is_null() {
        &input["required"]["ckpt_name"]
    } else {
        &input["ckpt_name"]
    };

    let models = ckpt_schema
        .get(0)
        .and_then(serde_json::Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    ModelCatalog::new(models)
}

/// Ordered preference keywords per scene type.
fn scene_preferences(scene_type: SceneType) -> &'static [&'static str] {
    match scene_type {
        SceneType::CarChase => &["realistic", "vision", "epic"],
        SceneType::FightScene => &["epic", "realistic", "dream"],
        SceneType::Explosion => &["juggernaut", "epic", "dream"],
        SceneType::AerialCombat => &["dream", "epic", "realistic"],
        SceneType::SpaceBattle => &["dream", "sci", "epic"],
        _ => &["realistic", "epic", "dream"],
    }
}

/// Select a checkpoint from the catalog.
///
/// Priority order:
/// 1. `preferred`, matched as a case-insensitive substring;
/// 2. the first WAN-family model;
/// 3. the scene-type preference keywords, first catalog hit in
///    keyword order;
/// 4. the first catalog entry.
///
/// An empty catalog is an error, not a guessed filename.
pub fn select_model(
    catalog: &ModelCatalog,
    scene_type: SceneType,
    preferred: Option<&str>,
) -> Result<String, NoModelAvailable> {
    if catalog.is_empty() {
        return Err(NoModelAvailable);
    }

    if let Some(preferred) = preferred {
        let needle = preferred.to_lowercase();
        if let Some(model) = catalog
            .iter()
            .find(|m| m.to_lowercase().contains(&needle))
        {
            return Ok(model.to_string());
        }
    }

    if let Some(model) = catalog
        .iter()
        .find(|m| m.to_lowercase().contains(WAN_FAMILY_MARKER))
    {
        return Ok(model.to_string());
    }

    for keyword in scene_preferences(scene_type) {
        if let Some(model) = catalog.iter().find(|m| m.to_lowercase().contains(keyword)) {
            return Ok(model.to_string());
        }
    }

    // Catalog is non-empty here, so first() always yields.
    Ok(catalog
        .iter()
        .next()
        .map(str::to_string)
        .unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
