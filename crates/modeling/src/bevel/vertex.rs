//! Vertex bevel.

use glam::DVec3;
use topology::geometry::perpendicular;
use topology::{Mesh, MeshEdit, StagedFace, TopologyError, VertexId, VertexRef};
use tracing::trace;

use super::{BevelOptions, BevelResult, bulge, check_options, commit, ring_t};
use crate::error::{ModelingError, Result};

/// Bevel a vertex by growing rings of new vertices along its edges.
///
/// Ring `s` places one vertex on each connected edge at `distance * t` from
/// the vertex, lifted along the outward direction by the sine profile.
/// Neighbours are ordered by angle around the outward axis; ring 1 is joined
/// to the vertex by a triangle fan and later rings by quads. Two edges give a
/// single strip. A lone edge gets two vertices per ring, offset to either side
/// of the edge, so it also grows a strip.
pub fn bevel_vertex(mesh: &mut Mesh, vertex: VertexId, options: &BevelOptions) -> Result<BevelResult> {
    trace!("bevel_vertex: START vertex={}", vertex);

    // ========================================================================
    // PHASE 1: GATHER (read-only, fail early)
    // ========================================================================
    check_options(options)?;
    let p = mesh
        .position(vertex)
        .ok_or(TopologyError::VertexNotFound(vertex))?;
    let neighbors = mesh.vertices_adjacent_to(vertex);
    if neighbors.is_empty() {
        return Err(ModelingError::NoEdgesAtVertex(vertex));
    }

    let mut spokes: Vec<DVec3> = Vec::with_capacity(neighbors.len());
    for &n in &neighbors {
        let q = mesh.position(n).ok_or(TopologyError::VertexNotFound(n))?;
        let dir = (q - p).try_normalize().ok_or_else(|| {
            ModelingError::Degenerate(format!("vertex {} coincides with neighbour {}", vertex, n))
        })?;
        spokes.push(dir);
    }

    let mean = neighbors
        .iter()
        .filter_map(|&n| mesh.position(n))
        .sum::<DVec3>()
        / neighbors.len() as f64;
    let outward = (p - mean)
        .try_normalize()
        .or_else(|| mesh.vertex_normal(vertex))
        .unwrap_or(DVec3::Z);

    let order = order_around_axis(&spokes, outward);
    let material = options.material_index.unwrap_or_else(|| {
        mesh.faces_of_vertex(vertex)
            .first()
            .and_then(|&f| mesh.face(f))
            .map_or(0, |f| f.material_index)
    });

    // ========================================================================
    // PHASE 2: STAGE
    // ========================================================================
    let side = match order.as_slice() {
        &[only] => Some(perpendicular(spokes[only]).unwrap_or(DVec3::Z)),
        _ => None,
    };
    let mut edit = MeshEdit::new();
    let mut prev_ring: Option<Vec<VertexRef>> = None;

    for ring in 1..=options.segments {
        let t = ring_t(ring, options.segments);
        let lift = outward * options.distance * bulge(options.profile, t);
        let current: Vec<VertexRef> = match side {
            Some(side) => {
                let base = p + spokes[order[0]] * options.distance * t + lift;
                let half = side * options.distance * t;
                vec![edit.add_vertex(base + half), edit.add_vertex(base - half)]
            }
            None => order
                .iter()
                .map(|&j| edit.add_vertex(p + spokes[j] * options.distance * t + lift))
                .collect(),
        };
        let k = current.len();

        match &prev_ring {
            None => match k {
                2 => {
                    edit.add_face(
                        StagedFace::new([vertex.into(), current[0], current[1]]).with_material(material),
                    );
                }
                _ => {
                    for j in 0..k {
                        edit.add_face(
                            StagedFace::new([vertex.into(), current[j], current[(j + 1) % k]])
                                .with_material(material),
                        );
                    }
                }
            },
            Some(prev) => match k {
                2 => {
                    edit.add_face(
                        StagedFace::new([prev[0], current[0], current[1], prev[1]]).with_material(material),
                    );
                }
                _ => {
                    for j in 0..k {
                        let next = (j + 1) % k;
                        edit.add_face(
                            StagedFace::new([prev[j], current[j], current[next], prev[next]])
                                .with_material(material),
                        );
                    }
                }
            },
        }
        prev_ring = Some(current);
    }

    trace!(
        "bevel_vertex: END {} spokes, staged {} vertices",
        order.len(),
        edit.staged_vertex_count()
    );
    commit(mesh, edit, 0, options, "bevel_vertex")
}

/// Indices of `spokes` sorted by angle around `axis`
fn order_around_axis(spokes: &[DVec3], axis: DVec3) -> Vec<usize> {
    let u = perpendicular(axis).unwrap_or(DVec3::X);
    let w = axis.cross(u);
    let mut order: Vec<(usize, f64)> = spokes
        .iter()
        .enumerate()
        .map(|(i, d)| (i, d.dot(w).atan2(d.dot(u))))
        .collect();
    order.sort_by(|a, b| a.1.total_cmp(&b.1));
    order.into_iter().map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use topology::mesh::fixtures;
    use topology::{Vertex, validate_mesh};

    fn corner_at(mesh: &Mesh, p: DVec3) -> VertexId {
        mesh.vertex_ids()
            .find(|&v| mesh.position(v) == Some(p))
            .unwrap()
    }

    #[test]
    fn test_cube_corner_bevel_is_monotonic() {
        let mut mesh = fixtures::cube();
        let v = corner_at(&mesh, DVec3::ONE);
        let before = mesh.stats();

        let result = bevel_vertex(&mut mesh, v, &BevelOptions::default()).unwrap();

        let after = mesh.stats();
        assert!(after.vertices > before.vertices);
        assert!(after.edges > before.edges);
        assert!(after.faces > before.faces);
        assert_eq!(result.vertices_created, 3);
        assert_eq!(result.faces_created, 3);
        assert!(validate_mesh(&mesh).is_valid);

        for &nv in &result.new_vertices {
            let d = mesh.position(nv).unwrap().distance(DVec3::ONE);
            assert_relative_eq!(d, 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_multi_segment_rings_use_quads() {
        let mut mesh = fixtures::cube();
        let v = corner_at(&mesh, DVec3::ZERO);
        let options = BevelOptions {
            segments: 3,
            ..Default::default()
        };
        let result = bevel_vertex(&mut mesh, v, &options).unwrap();
        assert_eq!(result.vertices_created, 9);
        // 3 fan triangles + 2 rings of 3 quads
        assert_eq!(result.faces_created, 9);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_isolated_vertex_is_rejected() {
        let mut mesh = Mesh::new("single");
        let v = mesh.add_vertex(Vertex::new(DVec3::ZERO));
        let err = bevel_vertex(&mut mesh, v, &BevelOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), format!("No edges connected to vertex {}", v));
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn test_wire_endpoint_grows_faces() {
        let mut mesh = fixtures::parallel_edges();
        let e = mesh.edge_ids().next().unwrap();
        let (a, _) = mesh.edge_endpoints(e).unwrap();
        let before = mesh.stats();

        let result = bevel_vertex(&mut mesh, a, &BevelOptions::default()).unwrap();

        let after = mesh.stats();
        assert!(after.vertices > before.vertices);
        assert!(after.edges > before.edges);
        assert!(after.faces > before.faces);
        assert_eq!(result.vertices_created, 2);
        assert_eq!(result.faces_created, 1);
        assert_eq!(result.edges_created, 3);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_wire_endpoint_rings_form_a_strip() {
        let mut mesh = fixtures::parallel_edges();
        let e = mesh.edge_ids().next().unwrap();
        let (a, _) = mesh.edge_endpoints(e).unwrap();
        let options = BevelOptions {
            segments: 2,
            ..Default::default()
        };

        let result = bevel_vertex(&mut mesh, a, &options).unwrap();

        // Triangle at the vertex, then one quad between the rings
        assert_eq!(result.vertices_created, 4);
        assert_eq!(result.faces_created, 2);
        assert_eq!(result.edges_created, 6);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_order_around_axis_is_cyclic() {
        let spokes = [DVec3::X, -DVec3::X, DVec3::Y, -DVec3::Y];
        let order = order_around_axis(&spokes, DVec3::Z);
        assert_eq!(order.len(), 4);
        // Opposite spokes are never adjacent in the ordering
        let pos = |i: usize| order.iter().position(|&x| x == i).unwrap();
        assert_eq!((pos(0) as i32 - pos(1) as i32).abs(), 2);
    }
}
