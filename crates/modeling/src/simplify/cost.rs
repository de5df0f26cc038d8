//! Edge collapse costs.

use topology::{EdgeId, Mesh};

use super::SimplifyOptions;

/// Cost of collapsing `e`: `length * (1 + curvature + boundary)`.
///
/// Curvature is the mean of `1 - |n1 . n2|` over every pair of faces on the
/// edge. The boundary term applies to edges with exactly one face when
/// `preserve_boundary` is set.
pub fn edge_cost(mesh: &Mesh, e: EdgeId, options: &SimplifyOptions) -> Option<f64> {
    let length = mesh.edge_length(e)?;
    let faces = mesh.faces_of_edge(e);

    let normals: Vec<_> = faces.iter().filter_map(|&f| mesh.face_normal(f)).collect();
    let mut bend = 0.0;
    let mut pairs = 0usize;
    for i in 0..normals.len() {
        for j in i + 1..normals.len() {
            bend += 1.0 - normals[i].dot(normals[j]).abs();
            pairs += 1;
        }
    }
    let curvature = if pairs > 0 { bend / pairs as f64 } else { 0.0 };

    let boundary = if options.preserve_boundary && faces.len() == 1 {
        options.boundary_cost
    } else {
        0.0
    };

    Some(length * (1.0 + curvature + boundary))
}

/// Every edge with its cost, cheapest first
pub fn rank_edges(mesh: &Mesh, options: &SimplifyOptions) -> Vec<(EdgeId, f64)> {
    let mut ranked: Vec<(EdgeId, f64)> = mesh
        .edge_ids()
        .filter_map(|e| edge_cost(mesh, e, options).map(|c| (e, c)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}
