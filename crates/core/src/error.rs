//! Core error type shared by the domain modules.

/// Errors produced while constructing or validating domain values.
///
/// These are caller bugs (malformed requests), not runtime failures,
/// and are raised immediately rather than folded into a result object.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Width/height violate the diffusion backend constraint.
    #[error("Invalid dimensions {width}x{height}: width and height must be positive multiples of 64")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// A request field failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
