//! ComfyUI workflow construction and execution client.
//!
//! Provides a typed workflow-graph model, a graph builder that turns a
//! [`cina_core::request::GenerationRequest`] into a ComfyUI node graph
//! (with ControlNet / LoRA / CLIP-skip splicing), model catalog
//! discovery and selection, and an HTTP submit-and-poll client that
//! always yields a displayable [`result::GenerationResult`].

pub mod api;
pub mod client;
pub mod error;
pub mod graph;
pub mod models;
pub mod presets;
pub mod result;
pub mod workflow;

pub use client::{ClientOptions, ComfyUIClient};
pub use error::{GenerationFailure, GraphError, NoModelAvailable};
pub use graph::{Link, Node, NodeId, NodeInput, WorkflowGraph};
pub use models::{select_model, ModelCatalog};
pub use result::GenerationResult;
pub use workflow::build_workflow;
