//! Bevel operator: offset ramp geometry around an edge, a vertex or a face.
//!
//! All three variants check their target and options before touching the mesh
//! and build the new geometry in a [`MeshEdit`], so an error never leaves a
//! half-built bevel behind.

mod edge;
mod face;
mod vertex;

use std::f64::consts::PI;

use glam::DVec3;
use polyforge_config::{DEFAULT_BEVEL_DISTANCE, DEFAULT_BEVEL_SEGMENTS};
use slotmap::KeyData;
use topology::{EdgeId, EditSummary, FaceId, Mesh, MeshEdit, ValidationReport, VertexId, validate_mesh};
use tracing::debug;

use crate::error::{ModelingError, Result};

pub use edge::bevel_edge;
pub use face::bevel_face;
pub use vertex::bevel_vertex;

/// Configuration for bevel operations.
#[derive(Debug, Clone)]
pub struct BevelOptions {
    /// Offset of the outermost ring (default: 0.1)
    pub distance: f64,
    /// Number of rings between the source and the offset (default: 1)
    pub segments: u32,
    /// Bulge of intermediate rings; 0 is a flat ramp (default: 0.0)
    pub profile: f64,
    /// Edge bevel only: also offset in the opposite direction (default: false)
    pub both_sides: bool,
    /// Keep the source element; when false the source edge is dissolved or the
    /// face cap is dropped (default: true)
    pub keep_original: bool,
    /// Edge bevel only: explicit offset direction instead of the derived
    /// perpendicular
    pub direction: Option<DVec3>,
    /// Material for new faces; defaults to the material of the source face
    pub material_index: Option<u32>,
    /// Attach a validation report to the result (default: false)
    pub validate: bool,
}

impl Default for BevelOptions {
    fn default() -> Self {
        Self {
            distance: DEFAULT_BEVEL_DISTANCE,
            segments: DEFAULT_BEVEL_SEGMENTS,
            profile: 0.0,
            both_sides: false,
            keep_original: true,
            direction: None,
            material_index: None,
            validate: false,
        }
    }
}

/// Element a bevel applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BevelTarget {
    Edge(EdgeId),
    Vertex(VertexId),
    Face(FaceId),
}

/// Outcome of a successful bevel
#[derive(Debug, Clone, Default)]
pub struct BevelResult {
    pub vertices_created: usize,
    pub edges_created: usize,
    pub faces_created: usize,
    pub faces_removed: usize,
    pub new_vertices: Vec<VertexId>,
    pub new_faces: Vec<FaceId>,
    pub validation: Option<ValidationReport>,
}

/// Bevel whichever element `target` names
pub fn bevel(mesh: &mut Mesh, target: BevelTarget, options: &BevelOptions) -> Result<BevelResult> {
    match target {
        BevelTarget::Edge(e) => bevel_edge(mesh, e, options),
        BevelTarget::Vertex(v) => bevel_vertex(mesh, v, options),
        BevelTarget::Face(f) => bevel_face(mesh, f, options),
    }
}

/// Bevel by a textual kind (`"edge"`, `"vertex"` or `"face"`) and raw key,
/// for callers that carry element selections as untyped data.
pub fn bevel_by_kind(
    mesh: &mut Mesh,
    kind: &str,
    key: KeyData,
    options: &BevelOptions,
) -> Result<BevelResult> {
    let target = match kind {
        "edge" => BevelTarget::Edge(EdgeId::from(key)),
        "vertex" => BevelTarget::Vertex(VertexId::from(key)),
        "face" => BevelTarget::Face(FaceId::from(key)),
        other => return Err(ModelingError::UnknownBevelType(other.to_string())),
    };
    bevel(mesh, target, options)
}

pub(crate) fn check_options(options: &BevelOptions) -> Result<()> {
    if !options.distance.is_finite() {
        return Err(ModelingError::invalid("distance", "must be finite"));
    }
    if !options.profile.is_finite() {
        return Err(ModelingError::invalid("profile", "must be finite"));
    }
    if options.segments == 0 {
        return Err(ModelingError::invalid("segments", "must be at least 1"));
    }
    Ok(())
}

/// Ring parameter `t` for ring `ring` of `segments`
pub(crate) fn ring_t(ring: u32, segments: u32) -> f64 {
    ring as f64 / segments as f64
}

/// Sine bulge: zero at both ends, `profile` at the middle ring
pub(crate) fn bulge(profile: f64, t: f64) -> f64 {
    profile * (PI * t).sin()
}

pub(crate) fn commit(
    mesh: &mut Mesh,
    edit: MeshEdit,
    faces_removed: usize,
    options: &BevelOptions,
    label: &str,
) -> Result<BevelResult> {
    let EditSummary {
        vertices,
        faces,
        edges_created,
        ..
    } = edit.commit(mesh)?;

    debug!(
        "{}: +{} vertices, +{} edges, +{} faces, -{} faces",
        label,
        vertices.len(),
        edges_created,
        faces.len(),
        faces_removed
    );

    Ok(BevelResult {
        vertices_created: vertices.len(),
        edges_created,
        faces_created: faces.len(),
        faces_removed,
        new_vertices: vertices,
        new_faces: faces,
        validation: options.validate.then(|| validate_mesh(mesh)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::Key;
    use topology::mesh::fixtures;

    #[test]
    fn test_dispatch_by_kind() {
        let mut mesh = fixtures::cube();
        let f = mesh.face_ids().next().unwrap();
        let result = bevel_by_kind(&mut mesh, "face", f.data(), &BevelOptions::default()).unwrap();
        assert_eq!(result.vertices_created, 4);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let mut mesh = fixtures::cube();
        let e = mesh.edge_ids().next().unwrap();
        let err = bevel_by_kind(&mut mesh, "corner", e.data(), &BevelOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown bevel type: corner");
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_missing_target_message() {
        let mut mesh = fixtures::cube();
        let e = mesh.edge_ids().next().unwrap();
        mesh.remove_edge(e).unwrap();
        let err = bevel(&mut mesh, BevelTarget::Edge(e), &BevelOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), format!("Edge {} not found", e));
    }

    #[test]
    fn test_zero_segments_rejected_before_mutation() {
        let mut mesh = fixtures::cube();
        let e = mesh.edge_ids().next().unwrap();
        let options = BevelOptions {
            segments: 0,
            ..Default::default()
        };
        assert!(matches!(
            bevel_edge(&mut mesh, e, &options),
            Err(ModelingError::InvalidParameter { name: "segments", .. })
        ));
        assert_eq!(mesh.stats().vertices, 8);
    }

    #[test]
    fn test_bulge_profile() {
        assert_eq!(bulge(1.0, 0.0), 0.0);
        assert!((bulge(2.0, 0.5) - 2.0).abs() < 1e-12);
        assert!(bulge(1.0, 1.0).abs() < 1e-12);
        assert_eq!(ring_t(1, 4), 0.25);
    }
}
