//! Edge bevel.

use glam::DVec3;
use topology::geometry::perpendicular;
use topology::{EdgeId, Mesh, MeshEdit, StagedFace, TopologyError, VertexId, VertexRef};
use tracing::trace;

use super::{BevelOptions, BevelResult, bulge, check_options, commit, ring_t};
use crate::error::{ModelingError, Result};

/// Bevel an edge by sweeping it along an offset direction.
///
/// Each ring `i` in `1..=segments` holds a copy of both endpoints moved by
/// `distance * (1 + profile * sin(PI * t))` along the offset, and consecutive
/// rings (ring 0 being the edge itself) are joined by quads. With
/// `both_sides` a mirrored set of rings is built along the negated offset.
///
/// With `keep_original = false` the source edge is dissolved: no quad joins it
/// to ring 1, and every face that used it is routed through ring 1 of the side
/// its centroid lies on.
pub fn bevel_edge(mesh: &mut Mesh, edge: EdgeId, options: &BevelOptions) -> Result<BevelResult> {
    trace!("bevel_edge: START edge={}", edge);

    // ========================================================================
    // PHASE 1: GATHER (read-only, fail early)
    // ========================================================================
    check_options(options)?;
    let (a, b) = mesh
        .edge_endpoints(edge)
        .ok_or(TopologyError::EdgeNotFound(edge))?;
    let (pa, pb) = mesh
        .edge_positions(edge)
        .ok_or(TopologyError::EdgeNotFound(edge))?;

    let dir = (pb - pa)
        .try_normalize()
        .ok_or_else(|| ModelingError::Degenerate(format!("edge {} has zero length", edge)))?;
    let offset = options
        .direction
        .and_then(DVec3::try_normalize)
        .or_else(|| perpendicular(dir))
        .ok_or_else(|| ModelingError::Degenerate(format!("no offset direction for edge {}", edge)))?;

    let sides: Vec<DVec3> = if options.both_sides {
        vec![offset, -offset]
    } else {
        vec![offset]
    };

    let adjacent = mesh.faces_of_edge(edge).to_vec();
    let material = options.material_index.unwrap_or_else(|| {
        adjacent
            .first()
            .and_then(|&f| mesh.face(f))
            .map_or(0, |f| f.material_index)
    });

    // ========================================================================
    // PHASE 2: STAGE
    // ========================================================================
    let mut edit = MeshEdit::new();
    let mut first_rings: Vec<(DVec3, VertexRef, VertexRef)> = Vec::with_capacity(sides.len());

    for &side in &sides {
        let mut prev: (VertexRef, VertexRef) = (a.into(), b.into());
        for ring in 1..=options.segments {
            let t = ring_t(ring, options.segments);
            let scale = options.distance * (1.0 + bulge(options.profile, t));
            let ra = edit.add_vertex(pa + side * scale);
            let rb = edit.add_vertex(pb + side * scale);

            if ring == 1 {
                first_rings.push((side, ra, rb));
            }
            if ring > 1 || options.keep_original {
                edit.add_face(StagedFace::new([prev.0, prev.1, rb, ra]).with_material(material));
            } else {
                // Dissolved source: keep the ring connected to the endpoints
                edit.add_edge(a, ra);
                edit.add_edge(b, rb);
                edit.add_edge(ra, rb);
            }
            prev = (ra, rb);
        }
    }

    if !options.keep_original {
        for &f in &adjacent {
            let Some(centroid) = mesh.face_centroid(f) else {
                continue;
            };
            let midpoint = (pa + pb) * 0.5;
            let toward = centroid - midpoint;
            // Ring whose offset points most toward the face
            let Some(&(_, ra, rb)) = first_rings.iter().max_by(|x, y| {
                toward.dot(x.0).total_cmp(&toward.dot(y.0))
            }) else {
                continue;
            };
            let face = mesh.face(f).ok_or(TopologyError::FaceNotFound(f))?;
            edit.rewire_face(f, reroute(face.vertices(), a, b, ra, rb));
        }
        edit.remove_edge(edge);
    }

    trace!(
        "bevel_edge: END staged {} vertices, {} faces",
        edit.staged_vertex_count(),
        edit.staged_face_count()
    );
    commit(mesh, edit, 0, options, "bevel_edge")
}

/// Replace the `a`-`b` side of a face loop with `a, ra, rb, b` (or the
/// reverse when the face runs `b` to `a`).
fn reroute(
    loop_vertices: &[VertexId],
    a: VertexId,
    b: VertexId,
    ra: VertexRef,
    rb: VertexRef,
) -> Vec<VertexRef> {
    let n = loop_vertices.len();
    let mut out = Vec::with_capacity(n + 2);
    for i in 0..n {
        let here = loop_vertices[i];
        let next = loop_vertices[(i + 1) % n];
        out.push(VertexRef::Existing(here));
        if here == a && next == b {
            out.push(ra);
            out.push(rb);
        } else if here == b && next == a {
            out.push(rb);
            out.push(ra);
        }
    }
    out
}
