//! Error types for mesh input, configuration and engine operations

use thiserror::Error;

/// Errors that can occur while loading meshes, reading configuration or
/// driving the layout engine
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A layer in the layer-size sequence has no nodes
    #[error("layer {layer} has size 0; every layer needs at least one node")]
    InvalidLayerSize { layer: usize },

    /// An index list whose length is not a multiple of three
    #[error("index count {0} is not a multiple of 3")]
    InvalidIndices(usize),

    /// A triangle index points past the end of the vertex list
    #[error("vertex index {index} out of range for {len} vertices")]
    IndexOutOfRange { index: usize, len: usize },

    /// Grid resolution must be at least one cell per axis
    #[error("invalid grid resolution: {0}")]
    InvalidResolution(usize),

    /// The operation needs a loaded mesh
    #[error("no mesh loaded")]
    NoMesh,

    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for layout operations
pub type LayoutResult<T> = Result<T, LayoutError>;
