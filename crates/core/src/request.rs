//! Generation request model and validation.
//!
//! A [`GenerationRequest`] carries everything the pipeline needs to
//! produce one scene: the base prompt, the scene description used for
//! prompt enhancement, and the sampling configuration used for graph
//! construction. Requests are validated up front; malformed requests
//! are caller bugs and raise [`CoreError`] immediately.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::scene::{CameraAngle, SceneType, ViolenceLevel};

/// Dimension granularity required by the diffusion backend.
pub const DIMENSION_MULTIPLE: u32 = 64;

/// Inclusive bounds for the sampling step count.
pub const MIN_STEPS: u32 = 1;
/// Upper bound for the sampling step count.
pub const MAX_STEPS: u32 = 150;

/// A single LoRA attachment: model fragment name plus blend strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraAttachment {
    /// LoRA file name as installed on the backend.
    pub name: String,
    /// Blend strength applied to both model and CLIP weights.
    pub strength: f32,
}

/// A ControlNet attachment guiding generation from a reference image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetAttachment {
    /// Conditioning type (`openpose`, `canny`, `depth`, ...).
    pub control_type: String,
    /// Conditioning strength in `[0, 1]`.
    pub strength: f32,
    /// Reference image name, as uploadable to the backend.
    pub image: String,
}

/// Scene description driving prompt enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneParameters {
    pub scene_type: SceneType,
    pub violence_level: ViolenceLevel,
    pub camera_angle: CameraAngle,
    /// Free-text location; empty means unset.
    #[serde(default)]
    pub setting: String,
    /// Lighting key (`dramatic`, `neon`, ...) or free text.
    #[serde(default)]
    pub lighting: String,
    /// Time of day; `"day"` or empty adds nothing to the prompt.
    #[serde(default)]
    pub time_of_day: String,
    /// Weather descriptor; empty means unset.
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub motion_blur: bool,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub props: Vec<String>,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            scene_type: SceneType::FightScene,
            violence_level: ViolenceLevel::Cinematic,
            camera_angle: CameraAngle::WideShot,
            setting: String::new(),
            lighting: String::new(),
            time_of_day: String::new(),
            weather: String::new(),
            motion_blur: false,
            characters: Vec::new(),
            props: Vec::new(),
        }
    }
}

/// Sampling configuration for one generation.
///
/// `steps` and `cfg_scale` are optional: when unset, the defaults from
/// the selected model's sampler preset apply. `seed` is optional: when
/// unset, the pipeline draws a random seed before graph construction
/// so that the graph builder itself stays deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub cfg_scale: Option<f32>,
    #[serde(default)]
    pub seed: Option<i64>,
    pub batch_size: u32,
    /// Overrides the default negative-prompt base when set.
    #[serde(default)]
    pub negative_prompt: Option<String>,
    /// Preferred checkpoint name, matched case-insensitively.
    #[serde(default)]
    pub preferred_model: Option<String>,
    #[serde(default)]
    pub loras: Vec<LoraAttachment>,
    #[serde(default)]
    pub controlnets: Vec<ControlNetAttachment>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 576,
            steps: None,
            cfg_scale: None,
            seed: None,
            batch_size: 1,
            negative_prompt: None,
            preferred_model: None,
            loras: Vec::new(),
            controlnets: Vec::new(),
        }
    }
}

/// One complete generation request from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Short base prompt; always preserved verbatim at the front of
    /// the enhanced prompt.
    pub prompt: String,
    pub scene: SceneParameters,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    /// Build a request with default scene and sampling parameters.
    pub fn new(prompt: impl Into<String>, scene_type: SceneType) -> Self {
        Self {
            prompt: prompt.into(),
            scene: SceneParameters {
                scene_type,
                ..SceneParameters::default()
            },
            config: GenerationConfig::default(),
        }
    }

    /// Validate the request invariants.
    ///
    /// - width/height are positive multiples of 64;
    /// - steps, when set, are in `[1, 150]`;
    /// - cfg_scale, when set, is positive and finite;
    /// - batch_size is at least 1;
    /// - every LoRA/ControlNet strength is finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        let c = &self.config;
        if c.width == 0
            || c.height == 0
            || c.width % DIMENSION_MULTIPLE != 0
            || c.height % DIMENSION_MULTIPLE != 0
        {
            return Err(CoreError::InvalidDimensions {
                width: c.width,
                height: c.height,
            });
        }
        if let Some(steps) = c.steps {
            if !(MIN_STEPS..=MAX_STEPS).contains(&steps) {
                return Err(CoreError::Validation(format!(
                    "steps must be in [{MIN_STEPS}, {MAX_STEPS}], got {steps}"
                )));
            }
        }
        if let Some(cfg) = c.cfg_scale {
            if !(cfg.is_finite() && cfg > 0.0) {
                return Err(CoreError::Validation(format!(
                    "cfg_scale must be a positive number, got {cfg}"
                )));
            }
        }
        if c.batch_size == 0 {
            return Err(CoreError::Validation(
                "batch_size must be at least 1".to_string(),
            ));
        }
        for lora in &c.loras {
            if lora.name.is_empty() {
                return Err(CoreError::Validation(
                    "LoRA attachment must have a name".to_string(),
                ));
            }
            if !lora.strength.is_finite() {
                return Err(CoreError::Validation(format!(
                    "LoRA '{}' has a non-finite strength",
                    lora.name
                )));
            }
        }
        for cn in &c.controlnets {
            if !cn.strength.is_finite() {
                return Err(CoreError::Validation(format!(
                    "ControlNet '{}' has a non-finite strength",
                    cn.control_type
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
