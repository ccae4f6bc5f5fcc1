//! Scene vocabulary: scene types, violence levels, and camera angles.
//!
//! String forms use `snake_case` to match the wire/storage format the
//! dashboard sends (`"car_chase"`, `"r_rated"`, ...).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Scene types
// ---------------------------------------------------------------------------

/// The kind of action scene being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneType {
    CarChase,
    FightScene,
    Explosion,
    Shootout,
    AerialCombat,
    SpaceBattle,
    BoxingMatch,
    MartialArts,
}

/// All scene types, in display order.
pub const ALL_SCENE_TYPES: &[SceneType] = &[
    SceneType::CarChase,
    SceneType::FightScene,
    SceneType::Explosion,
    SceneType::Shootout,
    SceneType::AerialCombat,
    SceneType::SpaceBattle,
    SceneType::BoxingMatch,
    SceneType::MartialArts,
];

impl SceneType {
    /// Canonical snake_case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CarChase => "car_chase",
            Self::FightScene => "fight_scene",
            Self::Explosion => "explosion",
            Self::Shootout => "shootout",
            Self::AerialCombat => "aerial_combat",
            Self::SpaceBattle => "space_battle",
            Self::BoxingMatch => "boxing_match",
            Self::MartialArts => "martial_arts",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        ALL_SCENE_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown scene type '{s}'. Valid types: {}",
                    ALL_SCENE_TYPES
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl std::fmt::Display for SceneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Violence levels
// ---------------------------------------------------------------------------

/// Intensity rating for the generated scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolenceLevel {
    Pg13,
    RRated,
    Cinematic,
}

/// All violence levels, in display order.
pub const ALL_VIOLENCE_LEVELS: &[ViolenceLevel] = &[
    ViolenceLevel::Pg13,
    ViolenceLevel::RRated,
    ViolenceLevel::Cinematic,
];

impl ViolenceLevel {
    /// Canonical snake_case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pg13 => "pg13",
            Self::RRated => "r_rated",
            Self::Cinematic => "cinematic",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        ALL_VIOLENCE_LEVELS
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown violence level '{s}'. Valid levels: {}",
                    ALL_VIOLENCE_LEVELS
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl std::fmt::Display for ViolenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Camera angles
// ---------------------------------------------------------------------------

/// Camera framing requested for the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraAngle {
    WideShot,
    MediumShot,
    CloseUp,
    LowAngle,
    HighAngle,
    DutchAngle,
    Pov,
}

/// All camera angles, in display order.
pub const ALL_CAMERA_ANGLES: &[CameraAngle] = &[
    CameraAngle::WideShot,
    CameraAngle::MediumShot,
    CameraAngle::CloseUp,
    CameraAngle::LowAngle,
    CameraAngle::HighAngle,
    CameraAngle::DutchAngle,
    CameraAngle::Pov,
];

impl CameraAngle {
    /// Canonical snake_case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WideShot => "wide_shot",
            Self::MediumShot => "medium_shot",
            Self::CloseUp => "close_up",
            Self::LowAngle => "low_angle",
            Self::HighAngle => "high_angle",
            Self::DutchAngle => "dutch_angle",
            Self::Pov => "pov",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        ALL_CAMERA_ANGLES
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown camera angle '{s}'. Valid angles: {}",
                    ALL_CAMERA_ANGLES
                        .iter()
                        .map(|a| a.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl std::fmt::Display for CameraAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_type_round_trips_through_string_form() {
        for t in ALL_SCENE_TYPES {
            assert_eq!(SceneType::parse(t.as_str()).unwrap(), *t);
        }
    }

    #[test]
    fn scene_type_rejects_unknown() {
        assert!(SceneType::parse("romance").is_err());
    }

    #[test]
    fn violence_level_round_trips_through_string_form() {
        for v in ALL_VIOLENCE_LEVELS {
            assert_eq!(ViolenceLevel::parse(v.as_str()).unwrap(), *v);
        }
    }

    #[test]
    fn camera_angle_round_trips_through_string_form() {
        for a in ALL_CAMERA_ANGLES {
            assert_eq!(CameraAngle::parse(a.as_str()).unwrap(), *a);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&SceneType::CarChase).unwrap();
        assert_eq!(json, "\"car_chase\"");
        let back: SceneType = serde_json::from_str("\"fight_scene\"").unwrap();
        assert_eq!(back, SceneType::FightScene);
        let level: ViolenceLevel = serde_json::from_str("\"r_rated\"").unwrap();
        assert_eq!(level, ViolenceLevel::RRated);
    }
}
