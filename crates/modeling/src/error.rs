//! Error types for the modeling operators.

use topology::{FaceId, TopologyError, VertexId};

/// Errors raised by fail-fast operators (bevel, bridge, simplification).
///
/// Missing targets surface as the wrapped [`TopologyError`], whose message
/// reads `"<Kind> <id> not found"`.
#[derive(Debug, thiserror::Error)]
pub enum ModelingError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("No edges connected to vertex {0}")]
    NoEdgesAtVertex(VertexId),

    #[error("No edges found for face {0}")]
    NoEdgesForFace(FaceId),

    #[error("Unknown bevel type: {0}")]
    UnknownBevelType(String),

    #[error("Cannot bridge edge to itself")]
    BridgeSameEdge,

    #[error("Edges are already connected")]
    EdgesAlreadyConnected,

    #[error("Cannot bridge face to itself")]
    BridgeSameFace,

    #[error("Faces are already connected")]
    FacesAlreadyConnected,

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Degenerate geometry: {0}")]
    Degenerate(String),
}

impl ModelingError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`ModelingError`].
pub type Result<T> = std::result::Result<T, ModelingError>;
