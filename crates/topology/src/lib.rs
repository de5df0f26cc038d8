//! Polygon mesh store for Polyforge.
//!
//! This crate provides the data layer the modeling operators work on:
//! - [`mesh::Mesh`] - vertex/edge/face store with stable handles and adjacency
//! - [`mesh::MeshEdit`] - staged, all-or-nothing edits
//! - [`mesh::validate_mesh`] - reference and adjacency checks
//! - [`json`] - positional JSON interchange
//! - [`snapshot`] - position snapshots for off-thread processing
//! - [`geometry`] - normals, centroids and bounding boxes

pub mod geometry;
pub mod json;
pub mod mesh;
pub mod snapshot;
pub mod types;

pub use geometry::Aabb;
pub use mesh::{
    CollapseOutcome, EdgeKind, EditSummary, IssueSeverity, Mesh, MeshEdit, RemovedEdge,
    RemovedVertex, StagedFace, ValidationIssue, ValidationReport, VertexRef, validate_mesh,
};
pub use snapshot::{PackedPosition, PositionSnapshot};
pub use types::*;
