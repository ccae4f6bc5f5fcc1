//! Prompt enhancement tables and assembly.
//!
//! Expands a short user prompt into the keyword-enriched positive
//! prompt the diffusion backends respond well to, plus the paired
//! negative prompt. Component ordering and per-table caps are a
//! contract with downstream regression baselines — change them only
//! together with the tests below.

use crate::request::SceneParameters;
use crate::scene::{CameraAngle, SceneType, ViolenceLevel};

/// Negative-prompt base used when the request does not override it.
pub const DEFAULT_NEGATIVE_BASE: &str =
    "low quality, blurry, distorted, amateur, worst quality, bad anatomy";

/// Caps applied when drawing from each table.
const SCENE_KEYWORD_CAP: usize = 3;
const VIOLENCE_MODIFIER_CAP: usize = 2;
const CAMERA_MODIFIER_CAP: usize = 2;
const LIGHTING_STYLE_CAP: usize = 2;
const CHARACTER_CAP: usize = 2;
const PROP_CAP: usize = 3;
const QUALITY_ENHANCER_CAP: usize = 4;
const ACTION_ENHANCER_CAP: usize = 3;

/// The enhanced positive/negative prompt pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EnhancedPrompt {
    pub positive: String,
    pub negative: String,
}

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

/// Scene-type keywords, strongest first.
pub fn scene_keywords(scene_type: SceneType) -> &'static [&'static str] {
    match scene_type {
        SceneType::CarChase => &[
            "high-speed car chase",
            "vehicle pursuit",
            "racing through streets",
            "police chase",
            "dramatic driving",
            "tire screeching",
            "speed blur",
        ],
        SceneType::FightScene => &[
            "intense combat",
            "martial arts fight",
            "hand-to-hand combat",
            "fighting poses",
            "action choreography",
            "dynamic movement",
        ],
        SceneType::Explosion => &[
            "massive explosion",
            "fireball",
            "debris flying",
            "blast wave",
            "smoke and fire",
            "destruction",
            "impact crater",
        ],
        SceneType::Shootout => &[
            "gunfight",
            "muzzle flashes",
            "cover shooting",
            "tactical combat",
            "bullets flying",
            "action movie shootout",
        ],
        SceneType::AerialCombat => &[
            "dogfight",
            "aerial battle",
            "fighter jets",
            "missiles firing",
            "aerial maneuvers",
            "sky combat",
            "aircraft battle",
        ],
        SceneType::SpaceBattle => &[
            "space warfare",
            "starships fighting",
            "laser beams",
            "spacecraft battle",
            "cosmic conflict",
            "space combat",
            "interstellar war",
        ],
        SceneType::BoxingMatch => &[
            "boxing match",
            "boxing ring",
            "fighting stance",
            "punch impact",
            "athletic combat",
            "sport fighting",
            "boxing gloves",
        ],
        SceneType::MartialArts => &[
            "martial arts",
            "kung fu fighting",
            "karate combat",
            "taekwondo",
            "combat arts",
            "fighting techniques",
            "martial combat",
        ],
    }
}

/// Violence-level modifier phrases.
pub fn violence_modifiers(level: ViolenceLevel) -> &'static [&'static str] {
    match level {
        ViolenceLevel::Pg13 => &[
            "mild action",
            "bloodless",
            "family-friendly action",
            "light impact",
            "non-graphic",
        ],
        ViolenceLevel::RRated => &[
            "intense action",
            "realistic impact",
            "dramatic violence",
            "action movie style",
            "cinematic intensity",
        ],
        ViolenceLevel::Cinematic => &[
            "epic action",
            "blockbuster style",
            "cinematic drama",
            "professional cinematography",
            "movie quality",
        ],
    }
}

/// Camera-angle modifier phrases.
pub fn camera_modifiers(angle: CameraAngle) -> &'static [&'static str] {
    match angle {
        CameraAngle::WideShot => &[
            "wide angle shot",
            "establishing shot",
            "full scene view",
            "panoramic view",
            "environmental context",
        ],
        CameraAngle::MediumShot => &[
            "medium shot",
            "waist up",
            "mid-range view",
            "balanced composition",
            "character focus",
        ],
        CameraAngle::CloseUp => &[
            "close-up shot",
            "facial detail",
            "intimate view",
            "emotional intensity",
            "detailed focus",
        ],
        CameraAngle::LowAngle => &[
            "low angle shot",
            "looking up",
            "heroic angle",
            "dramatic perspective",
            "power shot",
        ],
        CameraAngle::HighAngle => &[
            "high angle shot",
            "bird's eye view",
            "looking down",
            "aerial perspective",
            "overview shot",
        ],
        CameraAngle::DutchAngle => &[
            "dutch angle",
            "tilted camera",
            "dynamic angle",
            "tension angle",
            "unbalanced composition",
        ],
        CameraAngle::Pov => &[
            "point of view shot",
            "first person view",
            "character perspective",
            "immersive angle",
            "subjective camera",
        ],
    }
}

/// Lighting-style phrases for recognized lighting keys.
///
/// Returns `None` for unrecognized keys; the raw lighting string is
/// used verbatim in that case.
pub fn lighting_styles(key: &str) -> Option<&'static [&'static str]> {
    match key {
        "dramatic" => Some(&[
            "dramatic lighting",
            "chiaroscuro",
            "high contrast",
            "moody lighting",
        ]),
        "action" => Some(&[
            "dynamic lighting",
            "fast-paced lighting",
            "energetic illumination",
        ]),
        "cinematic" => Some(&[
            "cinematic lighting",
            "movie-style lighting",
            "professional lighting",
        ]),
        "night" => Some(&["night lighting", "low light", "shadows", "artificial lighting"]),
        "day" => Some(&["daylight", "natural lighting", "bright illumination"]),
        "sunset" => Some(&["golden hour", "warm lighting", "sunset glow"]),
        "neon" => Some(&[
            "neon lighting",
            "colorful lights",
            "urban glow",
            "cyberpunk lighting",
        ]),
        _ => None,
    }
}

/// Quality enhancer phrases, appended to every prompt (first 4 used).
pub const QUALITY_ENHANCERS: &[&str] = &[
    "8k resolution",
    "ultra detailed",
    "masterpiece",
    "best quality",
    "cinematic composition",
    "professional photography",
    "award winning",
    "hyper realistic",
    "photorealistic",
    "sharp focus",
    "high definition",
];

/// Action enhancer phrases, appended to every prompt (first 3 used).
pub const ACTION_ENHANCERS: &[&str] = &[
    "dynamic pose",
    "action shot",
    "motion blur",
    "speed lines",
    "impact frame",
    "explosive moment",
    "kinetic energy",
    "dramatic timing",
    "freeze frame",
    "action sequence",
    "stunt choreography",
];

/// Scene-specific negative clause, empty for scene types without one.
pub fn scene_negative(scene_type: SceneType) -> &'static str {
    match scene_type {
        SceneType::CarChase => "static cars, parked vehicles, slow motion",
        SceneType::FightScene => "peaceful, sitting, calm poses, static",
        SceneType::Explosion => "intact buildings, no effects, clean environment",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Enhancement
// ---------------------------------------------------------------------------

/// Build the enhanced positive/negative prompt pair for one scene.
///
/// The positive prompt always starts with `base_prompt` verbatim; each
/// subsequent component group is appended in fixed order with its table
/// cap applied, then everything is joined with `", "`.
pub fn enhance(base_prompt: &str, scene: &SceneParameters) -> EnhancedPrompt {
    let positive = build_positive(base_prompt, scene);
    let negative = build_negative(scene.scene_type, None);
    EnhancedPrompt { positive, negative }
}

/// [`enhance`] with an explicit negative-prompt base override.
pub fn enhance_with_negative_base(
    base_prompt: &str,
    scene: &SceneParameters,
    negative_base: Option<&str>,
) -> EnhancedPrompt {
    let positive = build_positive(base_prompt, scene);
    let negative = build_negative(scene.scene_type, negative_base);
    EnhancedPrompt { positive, negative }
}

fn build_positive(base_prompt: &str, scene: &SceneParameters) -> String {
    let mut components: Vec<String> = vec![base_prompt.to_string()];

    let extend = |components: &mut Vec<String>, words: &[&str], cap: usize| {
        components.extend(words.iter().take(cap).map(|w| w.to_string()));
    };

    extend(
        &mut components,
        scene_keywords(scene.scene_type),
        SCENE_KEYWORD_CAP,
    );
    extend(
        &mut components,
        violence_modifiers(scene.violence_level),
        VIOLENCE_MODIFIER_CAP,
    );
    extend(
        &mut components,
        camera_modifiers(scene.camera_angle),
        CAMERA_MODIFIER_CAP,
    );

    if !scene.setting.is_empty() {
        components.push(format!("set in {}", scene.setting));
    }

    if !scene.lighting.is_empty() {
        match lighting_styles(&scene.lighting) {
            Some(words) => extend(&mut components, words, LIGHTING_STYLE_CAP),
            None => components.push(scene.lighting.clone()),
        }
    }

    if !scene.time_of_day.is_empty() && scene.time_of_day != "day" {
        components.push(format!("{} time", scene.time_of_day));
    }
    if !scene.weather.is_empty() {
        components.push(format!("{} weather", scene.weather));
    }

    if scene.motion_blur {
        components.push("motion blur".to_string());
        components.push("speed effect".to_string());
    }

    if !scene.characters.is_empty() {
        let names = scene
            .characters
            .iter()
            .take(CHARACTER_CAP)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        components.push(format!("featuring {names}"));
    }

    if !scene.props.is_empty() {
        let props = scene
            .props
            .iter()
            .take(PROP_CAP)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        components.push(format!("with {props}"));
    }

    extend(&mut components, QUALITY_ENHANCERS, QUALITY_ENHANCER_CAP);
    extend(&mut components, ACTION_ENHANCERS, ACTION_ENHANCER_CAP);

    components.join(", ")
}

fn build_negative(scene_type: SceneType, negative_base: Option<&str>) -> String {
    let base = negative_base.unwrap_or(DEFAULT_NEGATIVE_BASE);
    let scene_specific = scene_negative(scene_type);
    if scene_specific.is_empty() {
        base.to_string()
    } else {
        format!("{base}, {scene_specific}")
    }
}

// ---------------------------------------------------------------------------
// Scene suggestions (dashboard helpers)
// ---------------------------------------------------------------------------

/// Suggestion lists surfaced next to the scene editor.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SceneSuggestions {
    pub keywords: &'static [&'static str],
    pub settings: &'static [&'static str],
    pub props: &'static [&'static str],
    pub characters: &'static [&'static str],
}

/// Suggestions for a scene type: keywords, settings, props, characters.
pub fn scene_suggestions(scene_type: SceneType) -> SceneSuggestions {
    SceneSuggestions {
        keywords: scene_keywords(scene_type),
        settings: setting_suggestions(scene_type),
        props: prop_suggestions(scene_type),
        characters: character_suggestions(scene_type),
    }
}

fn setting_suggestions(scene_type: SceneType) -> &'static [&'static str] {
    match scene_type {
        SceneType::CarChase => &[
            "busy city streets",
            "mountain highway",
            "desert road",
            "urban tunnel",
            "rainy highway",
            "bridge chase",
        ],
        SceneType::FightScene => &[
            "urban rooftop",
            "warehouse",
            "alleyway",
            "dojo",
            "underground fight club",
            "abandoned building",
        ],
        SceneType::Explosion => &[
            "industrial facility",
            "building demolition",
            "military base",
            "oil refinery",
            "construction site",
            "laboratory",
        ],
        SceneType::AerialCombat => &[
            "cloudy sky",
            "over ocean",
            "mountain valley",
            "urban airspace",
            "desert aerial",
            "storm clouds",
        ],
        SceneType::SpaceBattle => &[
            "deep space",
            "asteroid field",
            "planetary orbit",
            "nebula backdrop",
            "space station vicinity",
            "starfield",
        ],
        _ => &["generic action setting"],
    }
}

fn prop_suggestions(scene_type: SceneType) -> &'static [&'static str] {
    match scene_type {
        SceneType::CarChase => &[
            "sports cars",
            "motorcycles",
            "police vehicles",
            "helicopters",
            "roadblocks",
            "traffic",
        ],
        SceneType::FightScene => &[
            "martial arts weapons",
            "broken glass",
            "metal pipes",
            "wooden crates",
            "fire barrels",
            "chain-link fence",
        ],
        SceneType::Explosion => &[
            "dynamite",
            "fuel barrels",
            "debris",
            "smoke",
            "sparks",
            "shattered glass",
            "concrete chunks",
        ],
        SceneType::Shootout => &[
            "assault rifles",
            "pistols",
            "cover barriers",
            "muzzle flashes",
            "shell casings",
            "tactical gear",
        ],
        _ => &["action props"],
    }
}

fn character_suggestions(scene_type: SceneType) -> &'static [&'static str] {
    match scene_type {
        SceneType::CarChase => &[
            "professional driver",
            "police officer",
            "chase suspect",
            "motorcycle rider",
            "getaway driver",
        ],
        SceneType::FightScene => &[
            "martial artist",
            "street fighter",
            "trained combatant",
            "action hero",
            "skilled warrior",
        ],
        SceneType::BoxingMatch => &[
            "professional boxer",
            "heavyweight fighter",
            "athletic boxer",
            "boxing champion",
            "determined fighter",
        ],
        _ => &["action character"],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_scene(scene_type: SceneType) -> SceneParameters {
        SceneParameters {
            scene_type,
            violence_level: ViolenceLevel::Cinematic,
            camera_angle: CameraAngle::WideShot,
            ..SceneParameters::default()
        }
    }

    #[test]
    fn base_prompt_is_always_the_prefix() {
        for &scene_type in crate::scene::ALL_SCENE_TYPES {
            let result = enhance("two rivals collide", &bare_scene(scene_type));
            assert!(
                result.positive.starts_with("two rivals collide, "),
                "base prompt dropped for {scene_type}: {}",
                result.positive
            );
        }
    }

    #[test]
    fn minimal_scene_produces_exact_component_order() {
        let result = enhance("street brawl", &bare_scene(SceneType::FightScene));
        let expected = [
            "street brawl",
            // scene keywords, capped at 3
            "intense combat",
            "martial arts fight",
            "hand-to-hand combat",
            // violence modifiers, capped at 2
            "epic action",
            "blockbuster style",
            // camera modifiers, capped at 2
            "wide angle shot",
            "establishing shot",
            // quality enhancers, capped at 4
            "8k resolution",
            "ultra detailed",
            "masterpiece",
            "best quality",
            // action enhancers, capped at 3
            "dynamic pose",
            "action shot",
            "motion blur",
        ]
        .join(", ");
        assert_eq!(result.positive, expected);
    }

    #[test]
    fn full_scene_inserts_optional_clauses_in_order() {
        let scene = SceneParameters {
            scene_type: SceneType::CarChase,
            violence_level: ViolenceLevel::RRated,
            camera_angle: CameraAngle::LowAngle,
            setting: "neon-lit downtown".to_string(),
            lighting: "neon".to_string(),
            time_of_day: "night".to_string(),
            weather: "rainy".to_string(),
            motion_blur: true,
            characters: vec![
                "getaway driver".to_string(),
                "police officer".to_string(),
                "third wheel".to_string(),
            ],
            props: vec![
                "sports cars".to_string(),
                "helicopters".to_string(),
                "roadblocks".to_string(),
                "traffic".to_string(),
            ],
        };
        let result = enhance("midnight pursuit", &scene);
        let expected = [
            "midnight pursuit",
            "high-speed car chase",
            "vehicle pursuit",
            "racing through streets",
            "intense action",
            "realistic impact",
            "low angle shot",
            "looking up",
            "set in neon-lit downtown",
            "neon lighting",
            "colorful lights",
            "night time",
            "rainy weather",
            "motion blur",
            "speed effect",
            // characters capped at 2, props capped at 3
            "featuring getaway driver, police officer",
            "with sports cars, helicopters, roadblocks",
            "8k resolution",
            "ultra detailed",
            "masterpiece",
            "best quality",
            "dynamic pose",
            "action shot",
            "motion blur",
        ]
        .join(", ");
        assert_eq!(result.positive, expected);
    }

    #[test]
    fn unrecognized_lighting_is_used_verbatim() {
        let mut scene = bare_scene(SceneType::Explosion);
        scene.lighting = "bioluminescent glow".to_string();
        let result = enhance("refinery goes up", &scene);
        assert!(result.positive.contains("bioluminescent glow"));
        // No table phrases for an unknown key.
        assert!(!result.positive.contains("dramatic lighting"));
    }

    #[test]
    fn day_time_of_day_adds_nothing() {
        let mut scene = bare_scene(SceneType::Shootout);
        scene.time_of_day = "day".to_string();
        let result = enhance("alley standoff", &scene);
        assert!(!result.positive.contains("day time"));
    }

    #[test]
    fn negative_prompt_appends_scene_clause() {
        let result = enhance("pursuit", &bare_scene(SceneType::CarChase));
        assert_eq!(
            result.negative,
            format!("{DEFAULT_NEGATIVE_BASE}, static cars, parked vehicles, slow motion")
        );
    }

    #[test]
    fn negative_prompt_without_scene_clause_is_just_the_base() {
        let result = enhance("orbital strike", &bare_scene(SceneType::SpaceBattle));
        assert_eq!(result.negative, DEFAULT_NEGATIVE_BASE);
    }

    #[test]
    fn negative_base_override_is_respected() {
        let result = enhance_with_negative_base(
            "pursuit",
            &bare_scene(SceneType::FightScene),
            Some("cartoonish, low detail"),
        );
        assert_eq!(
            result.negative,
            "cartoonish, low detail, peaceful, sitting, calm poses, static"
        );
    }

    #[test]
    fn every_scene_type_has_at_least_three_keywords() {
        for &scene_type in crate::scene::ALL_SCENE_TYPES {
            assert!(
                scene_keywords(scene_type).len() >= 3,
                "{scene_type} has too few keywords"
            );
        }
    }

    #[test]
    fn suggestions_fall_back_for_uncovered_scene_types() {
        let s = scene_suggestions(SceneType::MartialArts);
        assert_eq!(s.settings, &["generic action setting"]);
        assert_eq!(s.characters, &["action character"]);
        assert!(!s.keywords.is_empty());
    }
}
