//! Error types for palette loading and pattern generation.

use thiserror::Error;

/// Failure while reading or validating a palette resource.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("unable to read palette: {0}")]
    Io(#[from] std::io::Error),

    #[error("palette JSON is malformed (expected `rgb` and `name` lists): {0}")]
    Json(#[from] serde_json::Error),

    #[error("palette lists differ in length: {rgb} colors, {name} names")]
    LengthMismatch { rgb: usize, name: usize },

    #[error("palette has no colors")]
    Empty,

    #[error("palette color {index} has a non-finite component")]
    NonFiniteComponent { index: usize },
}

/// Anything that aborts a pattern run.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to load palette: {0}")]
    ResourceLoad(#[from] PaletteError),

    #[error("no input image loaded")]
    InputMissing,

    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image is too small: square side {side} is less than grid size {grid_size}")]
    ImageTooSmall { side: u32, grid_size: u32 },

    #[error("a pattern run is already in progress")]
    Busy,

    #[error("rendering failed: {0}")]
    Render(String),
}
