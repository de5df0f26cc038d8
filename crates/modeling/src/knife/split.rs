//! Polygon surgery for knife cuts: inserting cut vertices into face
//! boundaries and splitting the result along chords.

use std::collections::HashMap;

use topology::{EdgeId, Face, Mesh, MeshEdit, VertexRef};

/// Vertices a cut inserts along one edge, sorted by the parameter measured
/// from the edge's first endpoint.
pub(crate) type EdgeInserts = HashMap<EdgeId, Vec<(f64, VertexRef)>>;

/// The face's vertex loop with cut vertices inserted along its hit edges,
/// respecting the direction the face walks each edge.
pub(crate) fn loop_with_inserts(mesh: &Mesh, face: &Face, inserts: &EdgeInserts) -> Vec<VertexRef> {
    let verts = face.vertices();
    let n = verts.len();
    let mut out = Vec::with_capacity(n);
    for (i, &e) in face.edges().iter().enumerate() {
        let here = verts[i];
        out.push(VertexRef::Existing(here));
        let (Some(along), Some(edge)) = (inserts.get(&e), mesh.edge(e)) else {
            continue;
        };
        if edge.v1 == here {
            out.extend(along.iter().map(|&(_, v)| v));
        } else {
            out.extend(along.iter().rev().map(|&(_, v)| v));
        }
    }
    out
}

/// Split whichever polygon holds both `a` and `b` as non-adjacent corners.
///
/// Returns false when no polygon qualifies; the chord is then skipped.
pub(crate) fn split_along(polygons: &mut Vec<Vec<VertexRef>>, a: VertexRef, b: VertexRef) -> bool {
    for k in 0..polygons.len() {
        let poly = &polygons[k];
        let n = poly.len();
        let (Some(i), Some(j)) = (
            poly.iter().position(|&v| v == a),
            poly.iter().position(|&v| v == b),
        ) else {
            continue;
        };
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        if hi - lo < 2 || lo + n - hi < 2 {
            continue;
        }

        let first: Vec<VertexRef> = poly[lo..=hi].to_vec();
        let mut second: Vec<VertexRef> = poly[hi..].to_vec();
        second.extend_from_slice(&poly[..=lo]);
        polygons[k] = first;
        polygons.push(second);
        return true;
    }
    false
}

/// Corner of `polygon` nearest to `from` that is not next to it, taken from
/// `candidates` only.
pub(crate) fn nearest_far_corner(
    mesh: &Mesh,
    edit: &MeshEdit,
    polygon: &[VertexRef],
    from: VertexRef,
    candidates: &[VertexRef],
) -> Option<VertexRef> {
    let n = polygon.len();
    let at = polygon.iter().position(|&v| v == from)?;
    let origin = edit.position(mesh, from)?;
    let prev = polygon[(at + n - 1) % n];
    let next = polygon[(at + 1) % n];

    polygon
        .iter()
        .copied()
        .filter(|&v| v != from && v != prev && v != next && candidates.contains(&v))
        .filter_map(|v| edit.position(mesh, v).map(|p| (v, p.distance(origin))))
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(v, _)| v)
}
