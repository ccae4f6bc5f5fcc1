//! Workflow graph assembly.
//!
//! Turns a validated [`GenerationRequest`] plus an enhanced prompt
//! pair and a selected checkpoint into the canonical text-to-image
//! graph, splicing in LoRA chains, CLIP-skip, and ControlNet
//! conditioning when the request asks for them.
//!
//! The builder is deterministic: identical inputs (including the
//! already-resolved seed) produce structurally identical graphs.

use cina_core::prompt::EnhancedPrompt;
use cina_core::request::{ControlNetAttachment, GenerationRequest};
use cina_core::CoreError;

use crate::error::GraphError;
use crate::graph::{Link, Node, NodeInput, WorkflowGraph};
use crate::presets::preset_for_model;

/// Map a ControlNet type to its preprocessor node.
///
/// Returns `None` for types without a mapping; the builder surfaces
/// that as [`GraphError::UnsupportedControlNetType`].
fn preprocessor_node(control_type: &str, image: Link) -> Option<Node> {
    let node = match control_type {
        "openpose" => Node::new("OpenposePreprocessor").titled("OpenPose Preprocessor"),
        "canny" => Node::new("CannyEdgePreprocessor")
            .titled("Canny Preprocessor")
            .input("low_threshold", NodeInput::value(100))
            .input("high_threshold", NodeInput::value(200)),
        "depth" => Node::new("MiDaS-DepthMapPreprocessor").titled("Depth Preprocessor"),
        "lineart" => Node::new("LineArtPreprocessor").titled("LineArt Preprocessor"),
        "normal" => Node::new("BAE-NormalMapPreprocessor").titled("Normal Map Preprocessor"),
        "seg" => Node::new("OneFormer-COCO-SemSegPreprocessor")
            .titled("Segmentation Preprocessor"),
        _ => return None,
    };
    Some(node.input("image", NodeInput::Link(image)))
}

/// Splice one ControlNet attachment into the graph.
///
/// Inserts loader, image-load, preprocessor, and apply nodes, and
/// returns the apply node's conditioning output, which replaces the
/// incoming `conditioning` link for the next attachment (or the
/// sampler).
fn splice_controlnet(
    graph: &mut WorkflowGraph,
    cn: &ControlNetAttachment,
    conditioning: Link,
) -> Result<Link, GraphError> {
    let loader = graph.add_node(
        Node::new("ControlNetLoader")
            .titled("Load ControlNet")
            .input(
                "control_net_name",
                NodeInput::value(format!("control_{}_sd15.pth", cn.control_type)),
            ),
    );
    let image = graph.add_node(
        Node::new("LoadImage")
            .titled("Load Control Image")
            .input("image", NodeInput::value(cn.image.clone())),
    );
    let pre = preprocessor_node(&cn.control_type, Link::new(image, 0))
        .ok_or_else(|| GraphError::UnsupportedControlNetType(cn.control_type.clone()))?;
    let pre = graph.add_node(pre);
    let apply = graph.add_node(
        Node::new("ControlNetApply")
            .titled("Apply ControlNet")
            .input("conditioning", NodeInput::Link(conditioning))
            .input("control_net", NodeInput::link(loader, 0))
            .input("image", NodeInput::link(pre, 0))
            .input("strength", NodeInput::value(cn.strength)),
    );
    Ok(Link::new(apply, 0))
}

/// Build the workflow graph for one generation.
///
/// `seed` must already be resolved by the caller; the builder contains
/// no randomness of its own. The returned graph has passed structural
/// validation.
pub fn build_workflow(
    request: &GenerationRequest,
    model_id: &str,
    prompts: &EnhancedPrompt,
    seed: i64,
) -> Result<WorkflowGraph, GraphError> {
    request.validate().map_err(|e| match e {
        CoreError::InvalidDimensions { width, height } => {
            GraphError::InvalidDimensions { width, height }
        }
        CoreError::Validation(msg) => GraphError::InvalidRequest(msg),
    })?;

    let config = &request.config;
    let preset = preset_for_model(model_id);
    let steps = config.steps.unwrap_or(preset.steps);
    let cfg = config.cfg_scale.unwrap_or(preset.cfg);

    let mut graph = WorkflowGraph::new();

    let ckpt = graph.add_node(
        Node::new("CheckpointLoaderSimple")
            .titled("Load Checkpoint")
            .input("ckpt_name", NodeInput::value(model_id)),
    );
    let mut model_link = Link::new(ckpt, 0);
    let mut clip_link = Link::new(ckpt, 1);

    // LoRA chain: model/clip thread through each loader in list order.
    for lora in &config.loras {
        let loader = graph.add_node(
            Node::new("LoraLoader")
                .titled(format!("Load LoRA {}", lora.name))
                .input("lora_name", NodeInput::value(lora.name.clone()))
                .input("strength_model", NodeInput::value(lora.strength))
                .input("strength_clip", NodeInput::value(lora.strength))
                .input("model", NodeInput::Link(model_link))
                .input("clip", NodeInput::Link(clip_link)),
        );
        model_link = Link::new(loader, 0);
        clip_link = Link::new(loader, 1);
    }

    // CLIP skip sits after the LoRA chain so it applies to the final
    // CLIP weights.
    if preset.clip_skip > 1 {
        let skip = graph.add_node(
            Node::new("CLIPSetLastLayer")
                .titled("CLIP Set Last Layer")
                .input(
                    "stop_at_clip_layer",
                    NodeInput::value(-(preset.clip_skip as i64)),
                )
                .input("clip", NodeInput::Link(clip_link)),
        );
        clip_link = Link::new(skip, 0);
    }

    let positive = graph.add_node(
        Node::new("CLIPTextEncode")
            .titled("CLIP Text Encode (Prompt)")
            .input("text", NodeInput::value(prompts.positive.clone()))
            .input("clip", NodeInput::Link(clip_link)),
    );
    let negative = graph.add_node(
        Node::new("CLIPTextEncode")
            .titled("CLIP Text Encode (Negative)")
            .input("text", NodeInput::value(prompts.negative.clone()))
            .input("clip", NodeInput::Link(clip_link)),
    );

    let latent = graph.add_node(
        Node::new("EmptyLatentImage")
            .titled("Empty Latent Image")
            .input("width", NodeInput::value(config.width))
            .input("height", NodeInput::value(config.height))
            .input("batch_size", NodeInput::value(config.batch_size)),
    );

    // ControlNet attachments chain apply-to-apply off the positive
    // conditioning.
    let mut conditioning = Link::new(positive, 0);
    for cn in &config.controlnets {
        conditioning = splice_controlnet(&mut graph, cn, conditioning)?;
    }

    let sampler = graph.add_node(
        Node::new("KSampler")
            .titled("KSampler")
            .input("seed", NodeInput::value(seed))
            .input("steps", NodeInput::value(steps))
            .input("cfg", NodeInput::value(cfg))
            .input("sampler_name", NodeInput::value(preset.sampler_name))
            .input("scheduler", NodeInput::value(preset.scheduler))
            .input("denoise", NodeInput::value(1))
            .input("model", NodeInput::Link(model_link))
            .input("positive", NodeInput::Link(conditioning))
            .input("negative", NodeInput::link(negative, 0))
            .input("latent_image", NodeInput::link(latent, 0)),
    );

    let decode = graph.add_node(
        Node::new("VAEDecode")
            .titled("VAE Decode")
            .input("samples", NodeInput::link(sampler, 0))
            .input("vae", NodeInput::link(ckpt, 2)),
    );

    graph.add_node(
        Node::new("SaveImage")
            .titled("Save Image")
            .input(
                "filename_prefix",
                NodeInput::value(format!("action_{}", request.scene.scene_type)),
            )
            .input("images", NodeInput::link(decode, 0)),
    );

    graph.validate()?;
    Ok(graph)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
