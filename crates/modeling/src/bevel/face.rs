//! Face bevel (inset with optional lift).

use glam::DVec3;
use topology::geometry::polygon_normal;
use topology::{FaceId, Mesh, MeshEdit, StagedFace, TopologyError, VertexRef};
use tracing::trace;

use super::{BevelOptions, BevelResult, bulge, check_options, commit, ring_t};
use crate::error::{ModelingError, Result};

/// Smallest bisector/edge-normal cosine used to scale a corner; sharper
/// corners are capped at ten times the inset distance
const MIN_MITER: f64 = 0.1;

/// Bevel a face by insetting its perimeter in rings.
///
/// Each corner moves along the inward bisector of its two edge perpendiculars
/// (`normal x edge`), scaled so every edge is inset by `distance * t`, plus
/// `normal * distance * profile * sin(PI * t)`. Consecutive rings are joined
/// by quads and the face itself is moved onto the last ring as a cap, keeping
/// its handle. With
/// `keep_original = false` the cap is removed and the ring is left open.
pub fn bevel_face(mesh: &mut Mesh, face: FaceId, options: &BevelOptions) -> Result<BevelResult> {
    trace!("bevel_face: START face={}", face);

    // ========================================================================
    // PHASE 1: GATHER (read-only, fail early)
    // ========================================================================
    check_options(options)?;
    let source = mesh.face(face).ok_or(TopologyError::FaceNotFound(face))?;
    if source.edges().is_empty() {
        return Err(ModelingError::NoEdgesForFace(face));
    }
    let corners = source.vertices().to_vec();
    let material = options.material_index.unwrap_or(source.material_index);
    let positions = mesh
        .face_positions(face)
        .ok_or(TopologyError::FaceNotFound(face))?;
    let normal = polygon_normal(&positions)
        .ok_or_else(|| ModelingError::Degenerate(format!("face {} has no normal", face)))?;

    let n = corners.len();
    let mut bisectors = Vec::with_capacity(n);
    for i in 0..n {
        let prev = positions[(i + n - 1) % n];
        let here = positions[i];
        let next = positions[(i + 1) % n];
        let in_prev = normal.cross(here - prev).try_normalize().unwrap_or(DVec3::ZERO);
        let in_next = normal.cross(next - here).try_normalize().unwrap_or(DVec3::ZERO);
        let bisector = (in_prev + in_next)
            .try_normalize()
            .or_else(|| in_next.try_normalize())
            .ok_or_else(|| ModelingError::Degenerate(format!("corner {} of face {}", i, face)))?;
        let miter = bisector.dot(in_next).max(MIN_MITER);
        bisectors.push(bisector / miter);
    }

    // ========================================================================
    // PHASE 2: STAGE
    // ========================================================================
    let mut edit = MeshEdit::new();
    let mut prev: Vec<VertexRef> = corners.iter().map(|&v| v.into()).collect();

    for ring in 1..=options.segments {
        let t = ring_t(ring, options.segments);
        let lift = normal * options.distance * bulge(options.profile, t);
        let current: Vec<VertexRef> = (0..n)
            .map(|i| edit.add_vertex(positions[i] + bisectors[i] * options.distance * t + lift))
            .collect();

        for i in 0..n {
            let j = (i + 1) % n;
            edit.add_face(
                StagedFace::new([prev[i], prev[j], current[j], current[i]]).with_material(material),
            );
        }
        prev = current;
    }

    let faces_removed = if options.keep_original {
        edit.rewire_face(face, prev);
        0
    } else {
        edit.remove_face(face);
        1
    };

    trace!("bevel_face: END {} corners, {} rings", n, options.segments);
    commit(mesh, edit, faces_removed, options, "bevel_face")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use topology::mesh::fixtures;
    use topology::validate_mesh;

    #[test]
    fn test_inset_square() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let f = mesh.face_ids().next().unwrap();

        let result = bevel_face(&mut mesh, f, &BevelOptions::default()).unwrap();

        assert_eq!(result.vertices_created, 4);
        assert_eq!(result.faces_created, 4);
        assert_eq!(mesh.face_count(), 5);
        // The cap keeps its handle and every side sits `distance` inside
        let cap = mesh.face_positions(f).unwrap();
        assert_relative_eq!(cap[0].x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(cap[0].y, 0.1, epsilon = 1e-12);
        for p in &cap {
            assert_relative_eq!(p.x.min(1.0 - p.x), 0.1, epsilon = 1e-12);
            assert_relative_eq!(p.y.min(1.0 - p.y), 0.1, epsilon = 1e-12);
        }
        assert_relative_eq!(mesh.face_normal(f).unwrap().z, 1.0, epsilon = 1e-12);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_cube_face_bevel_is_monotonic() {
        let mut mesh = fixtures::cube();
        let f = mesh.face_ids().next().unwrap();
        let before = mesh.stats();
        let options = BevelOptions {
            segments: 2,
            profile: 0.5,
            ..Default::default()
        };

        bevel_face(&mut mesh, f, &options).unwrap();

        let after = mesh.stats();
        assert!(after.vertices > before.vertices);
        assert!(after.edges > before.edges);
        assert!(after.faces > before.faces);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_profile_lifts_middle_ring() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let options = BevelOptions {
            segments: 2,
            profile: 1.0,
            ..Default::default()
        };
        let result = bevel_face(&mut mesh, f, &options).unwrap();
        let middle = mesh.position(result.new_vertices[0]).unwrap();
        let last = mesh.position(result.new_vertices[4]).unwrap();
        assert_relative_eq!(middle.z, 0.1, epsilon = 1e-12);
        assert_relative_eq!(last.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drop_cap() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let options = BevelOptions {
            keep_original: false,
            ..Default::default()
        };
        let result = bevel_face(&mut mesh, f, &options).unwrap();
        assert_eq!(result.faces_removed, 1);
        assert!(mesh.face(f).is_none());
        assert_eq!(mesh.face_count(), 4);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_material_override() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let options = BevelOptions {
            material_index: Some(4),
            ..Default::default()
        };
        let result = bevel_face(&mut mesh, f, &options).unwrap();
        for nf in result.new_faces {
            assert_eq!(mesh.face(nf).unwrap().material_index, 4);
        }
        assert_eq!(mesh.face(f).unwrap().material_index, 0);
    }
}
