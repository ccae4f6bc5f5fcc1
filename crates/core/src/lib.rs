//! Domain types for the CinaKinetic generation core.
//!
//! Holds the scene vocabulary (scene types, violence levels, camera
//! angles), the [`request::GenerationRequest`] model with its
//! validation rules, and the prompt enhancement tables that turn a
//! short user prompt into a full diffusion prompt pair.

pub mod error;
pub mod prompt;
pub mod request;
pub mod scene;

pub use error::CoreError;
