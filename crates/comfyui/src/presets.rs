//! Model-keyed sampler presets.
//!
//! Sampler, scheduler, step count, guidance, and CLIP-skip defaults
//! are tuned per model family rather than per call site. WAN-family
//! checkpoints on the rented pods respond best to a karras schedule
//! with CLIP-skip 2; everything else gets the generic SD settings.

/// Sampler settings applied when the request leaves them unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerPreset {
    pub sampler_name: &'static str,
    pub scheduler: &'static str,
    pub steps: u32,
    pub cfg: f32,
    /// Number of final CLIP layers to skip; 1 means no skip node.
    pub clip_skip: u32,
}

/// Marker token identifying the preferred WAN model family.
pub const WAN_FAMILY_MARKER: &str = "wan";

/// Preset for WAN-family checkpoints.
pub const WAN_PRESET: SamplerPreset = SamplerPreset {
    sampler_name: "dpmpp_2m_karras",
    scheduler: "karras",
    steps: 25,
    cfg: 6.5,
    clip_skip: 2,
};

/// Generic fallback preset.
pub const DEFAULT_PRESET: SamplerPreset = SamplerPreset {
    sampler_name: "euler_a",
    scheduler: "normal",
    steps: 28,
    cfg: 7.5,
    clip_skip: 1,
};

/// Look up the sampler preset for a checkpoint name.
pub fn preset_for_model(model_id: &str) -> &'static SamplerPreset {
    if model_id.to_lowercase().contains(WAN_FAMILY_MARKER) {
        &WAN_PRESET
    } else {
        &DEFAULT_PRESET
    }
}
