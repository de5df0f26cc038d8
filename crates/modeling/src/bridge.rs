//! Bridge operator: connecting geometry between two edges, edge sequences,
//! two faces, or an edge selection grouped into chains.
//!
//! Single-target calls (`bridge_edges`, `bridge_faces`) fail fast before any
//! mutation. Batch calls (`bridge_edge_sequence`, `bridge_selected_edges`)
//! never fail as a whole: each failing item is recorded and the rest continue.

use std::collections::HashMap;

use glam::DVec3;
use polyforge_config::DEFAULT_EPSILON;
use serde::{Deserialize, Serialize};
use topology::{
    EdgeId, FaceId, Mesh, MeshEdit, StagedFace, TopologyError, ValidationReport, VertexId,
    VertexRef, validate_mesh,
};
use tracing::{debug, trace, warn};

use crate::error::{ModelingError, Result};

/// Configuration for bridge operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeOptions {
    /// Quads between the edges and the midline; triangles when false (default: true)
    pub create_quads: bool,
    /// Displacement of the midline along the averaged face normal (default: 0.0)
    pub smoothness: f64,
    /// Material of the new faces (default: 0)
    pub material_index: u32,
    /// Attach a validation report to the result (default: false)
    pub validate: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            create_quads: true,
            smoothness: 0.0,
            material_index: 0,
            validate: false,
        }
    }
}

/// Outcome of a single-target bridge
#[derive(Debug, Clone, Default)]
pub struct BridgeResult {
    pub vertices_created: usize,
    pub edges_created: usize,
    pub faces_created: usize,
    pub new_vertices: Vec<VertexId>,
    pub new_faces: Vec<FaceId>,
    pub validation: Option<ValidationReport>,
}

/// A batch item that could not be bridged
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeFailure {
    /// Position of the item in the batch
    pub index: usize,
    pub error: String,
}

/// Outcome of a batch bridge
#[derive(Debug, Clone, Default)]
pub struct BridgeBatchResult {
    /// True when at least one item was bridged and none failed
    pub success: bool,
    pub bridged: usize,
    pub vertices_created: usize,
    pub edges_created: usize,
    pub faces_created: usize,
    pub failures: Vec<BridgeFailure>,
    /// Problem with the batch as a whole (empty input, mismatched lengths)
    pub error: Option<String>,
    pub validation: Option<ValidationReport>,
}

impl BridgeBatchResult {
    fn rejected(error: impl Into<String>) -> Self {
        let error = error.into();
        warn!("bridge: batch rejected: {}", error);
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    fn record(&mut self, index: usize, outcome: Result<BridgeResult>) {
        match outcome {
            Ok(result) => {
                self.bridged += 1;
                self.vertices_created += result.vertices_created;
                self.edges_created += result.edges_created;
                self.faces_created += result.faces_created;
            }
            Err(e) => {
                warn!("bridge: item {} failed: {}", index, e);
                self.failures.push(BridgeFailure {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    fn finish(mut self, mesh: &Mesh, options: &BridgeOptions) -> Self {
        self.success = self.error.is_none() && self.failures.is_empty() && self.bridged > 0;
        if options.validate {
            self.validation = Some(validate_mesh(mesh));
        }
        self
    }
}

/// Bridge two disjoint edges with a midline of two new vertices.
///
/// Endpoints are paired by the smaller total distance. Creates two quads, or
/// four triangles when `create_quads` is false.
pub fn bridge_edges(
    mesh: &mut Mesh,
    first: EdgeId,
    second: EdgeId,
    options: &BridgeOptions,
) -> Result<BridgeResult> {
    trace!("bridge_edges: START {} <-> {}", first, second);
    bridge_edge_pairs(mesh, &[(first, second)], options, "bridge_edges")
}

/// Bridge `first[i]` to `second[i]` for every index, one commit per pair
pub fn bridge_edge_sequence(
    mesh: &mut Mesh,
    first: &[EdgeId],
    second: &[EdgeId],
    options: &BridgeOptions,
) -> BridgeBatchResult {
    if first.is_empty() || second.is_empty() {
        return BridgeBatchResult::rejected("No edges provided");
    }
    if first.len() != second.len() {
        return BridgeBatchResult::rejected(format!(
            "Edge sequences differ in length ({} vs {})",
            first.len(),
            second.len()
        ));
    }

    let mut batch = BridgeBatchResult::default();
    for (i, (&a, &b)) in first.iter().zip(second).enumerate() {
        batch.record(i, bridge_edges(mesh, a, b, options));
    }
    debug!(
        "bridge_edge_sequence: {}/{} pairs bridged",
        batch.bridged,
        first.len()
    );
    batch.finish(mesh, options)
}

/// Bridge two faces by matching their edges by closest midpoints.
///
/// Matched pairs that share an endpoint share the midline vertex, so the
/// result is a closed band when the faces have the same corner count. Both
/// source faces are kept; on a closed mesh their edges end up with three faces.
pub fn bridge_faces(
    mesh: &mut Mesh,
    first: FaceId,
    second: FaceId,
    options: &BridgeOptions,
) -> Result<BridgeResult> {
    trace!("bridge_faces: START {} <-> {}", first, second);

    // ========================================================================
    // PHASE 1: VALIDATE
    // ========================================================================
    let face_a = mesh.face(first).ok_or(TopologyError::FaceNotFound(first))?;
    let face_b = mesh.face(second).ok_or(TopologyError::FaceNotFound(second))?;
    if first == second {
        return Err(ModelingError::BridgeSameFace);
    }
    if face_a.vertices().iter().any(|&v| face_b.contains_vertex(v)) {
        return Err(ModelingError::FacesAlreadyConnected);
    }

    let with_midpoints = |edges: &[EdgeId]| -> Vec<(EdgeId, DVec3)> {
        edges
            .iter()
            .filter_map(|&e| mesh.edge_midpoint(e).map(|m| (e, m)))
            .collect()
    };
    let edges_a = with_midpoints(face_a.edges());
    let edges_b = with_midpoints(face_b.edges());
    let pairs = greedy_match(&edges_a, &edges_b);

    // ========================================================================
    // PHASE 2: STAGE + COMMIT
    // ========================================================================
    bridge_edge_pairs(mesh, &pairs, options, "bridge_faces")
}

/// Group a selection into connected chains, pair chains by closest centroids,
/// then bridge the edges of each chain pair matched by closest midpoints.
///
/// Each chain pair is committed separately; a failing pair is recorded and
/// the others continue. Failures for edges missing from the mesh carry their
/// selection index, failures of a chain pair carry the pair's index.
pub fn bridge_selected_edges(
    mesh: &mut Mesh,
    edges: &[EdgeId],
    options: &BridgeOptions,
) -> BridgeBatchResult {
    if edges.is_empty() {
        return BridgeBatchResult::rejected("No edges provided");
    }

    let mut batch = BridgeBatchResult::default();
    let mut live: Vec<EdgeId> = Vec::with_capacity(edges.len());
    for (i, &e) in edges.iter().enumerate() {
        if !mesh.contains_edge(e) {
            batch.record(i, Err(TopologyError::EdgeNotFound(e).into()));
        } else if !live.contains(&e) {
            live.push(e);
        }
    }

    let chains = group_chains(mesh, &live);
    if chains.len() < 2 {
        batch.error = Some("Need at least two separate edge chains".to_string());
        warn!("bridge_selected_edges: only {} chain(s) in selection", chains.len());
        return batch.finish(mesh, options);
    }

    let centroids: Vec<(usize, DVec3)> = chains
        .iter()
        .enumerate()
        .filter_map(|(i, chain)| {
            let mids: Vec<DVec3> = chain.iter().filter_map(|&e| mesh.edge_midpoint(e)).collect();
            topology::geometry::centroid(&mids).map(|c| (i, c))
        })
        .collect();

    for (index, (ca, cb)) in pair_chains(&centroids).into_iter().enumerate() {
        let mids = |chain: &[EdgeId]| -> Vec<(EdgeId, DVec3)> {
            chain
                .iter()
                .filter_map(|&e| mesh.edge_midpoint(e).map(|m| (e, m)))
                .collect()
        };
        let pairs = greedy_match(&mids(&chains[ca]), &mids(&chains[cb]));
        batch.record(
            index,
            bridge_edge_pairs(mesh, &pairs, options, "bridge_selected_edges"),
        );
    }

    debug!(
        "bridge_selected_edges: {} chains, {} chain pairs bridged",
        chains.len(),
        batch.bridged
    );
    batch.finish(mesh, options)
}

fn check_edge_pair(mesh: &Mesh, first: EdgeId, second: EdgeId) -> Result<()> {
    let a = mesh.edge(first).ok_or(TopologyError::EdgeNotFound(first))?;
    let b = mesh.edge(second).ok_or(TopologyError::EdgeNotFound(second))?;
    if first == second {
        return Err(ModelingError::BridgeSameEdge);
    }
    if a.shares_vertex(b) {
        return Err(ModelingError::EdgesAlreadyConnected);
    }
    Ok(())
}

/// Stage and commit bridges for every pair in one edit
fn bridge_edge_pairs(
    mesh: &mut Mesh,
    pairs: &[(EdgeId, EdgeId)],
    options: &BridgeOptions,
    label: &str,
) -> Result<BridgeResult> {
    if pairs.is_empty() {
        return Err(ModelingError::Degenerate("nothing to bridge".to_string()));
    }
    for &(a, b) in pairs {
        check_edge_pair(mesh, a, b)?;
    }

    let mut edit = MeshEdit::new();
    let mut midline: HashMap<(VertexId, VertexId), VertexRef> = HashMap::new();
    for &(a, b) in pairs {
        stage_pair(mesh, &mut edit, &mut midline, a, b, options)?;
    }

    let summary = edit.commit(mesh)?;
    debug!(
        "{}: {} pairs, +{} vertices, +{} faces",
        label,
        pairs.len(),
        summary.vertices.len(),
        summary.faces.len()
    );
    Ok(BridgeResult {
        vertices_created: summary.vertices.len(),
        edges_created: summary.edges_created,
        faces_created: summary.faces.len(),
        new_vertices: summary.vertices,
        new_faces: summary.faces,
        validation: options.validate.then(|| validate_mesh(mesh)),
    })
}

fn stage_pair(
    mesh: &Mesh,
    edit: &mut MeshEdit,
    midline: &mut HashMap<(VertexId, VertexId), VertexRef>,
    first: EdgeId,
    second: EdgeId,
    options: &BridgeOptions,
) -> Result<()> {
    let (a1, b1) = mesh
        .edge_endpoints(first)
        .ok_or(TopologyError::EdgeNotFound(first))?;
    let (a2, b2) = mesh
        .edge_endpoints(second)
        .ok_or(TopologyError::EdgeNotFound(second))?;
    let pos = |v: VertexId| mesh.position(v).ok_or(TopologyError::VertexNotFound(v));
    let (pa1, pb1, pa2, pb2) = (pos(a1)?, pos(b1)?, pos(a2)?, pos(b2)?);

    // Pair endpoints by the smaller total distance
    let straight = pa1.distance(pa2) + pb1.distance(pb2);
    let crossed = pa1.distance(pb2) + pb1.distance(pa2);
    let (c, d) = if crossed + DEFAULT_EPSILON < straight {
        (b2, a2)
    } else {
        (a2, b2)
    };

    let normal = mesh
        .faces_of_edge(first)
        .iter()
        .chain(mesh.faces_of_edge(second))
        .filter_map(|&f| mesh.face_normal(f))
        .sum::<DVec3>()
        .try_normalize()
        .unwrap_or(DVec3::ZERO);

    let mut mid = |p: VertexId, q: VertexId| -> Result<VertexRef> {
        if let Some(&r) = midline.get(&(p, q)) {
            return Ok(r);
        }
        let at = (pos(p)? + pos(q)?) * 0.5 + normal * options.smoothness;
        let r = edit.add_vertex(at);
        midline.insert((p, q), r);
        Ok(r)
    };
    let ma = mid(a1, c)?;
    let mb = mid(b1, d)?;

    let (a1, b1, c, d): (VertexRef, VertexRef, VertexRef, VertexRef) =
        (a1.into(), b1.into(), c.into(), d.into());
    let faces: Vec<Vec<VertexRef>> = if options.create_quads {
        vec![vec![a1, b1, mb, ma], vec![ma, mb, d, c]]
    } else {
        vec![
            vec![a1, b1, mb],
            vec![a1, mb, ma],
            vec![ma, mb, d],
            vec![ma, d, c],
        ]
    };
    for verts in faces {
        edit.add_face(StagedFace::new(verts).with_material(options.material_index));
    }
    Ok(())
}

/// Greedy closest-first matching; each item is used at most once
fn greedy_match<A: Copy, B: Copy>(
    left: &[(A, DVec3)],
    right: &[(B, DVec3)],
) -> Vec<(A, B)> {
    let mut candidates: Vec<(f64, usize, usize)> = Vec::with_capacity(left.len() * right.len());
    for (i, (_, p)) in left.iter().enumerate() {
        for (j, (_, q)) in right.iter().enumerate() {
            candidates.push((p.distance_squared(*q), i, j));
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut used_left = vec![false; left.len()];
    let mut used_right = vec![false; right.len()];
    let mut pairs = Vec::new();
    for (_, i, j) in candidates {
        if used_left[i] || used_right[j] {
            continue;
        }
        used_left[i] = true;
        used_right[j] = true;
        pairs.push((left[i].0, right[j].0));
    }
    pairs
}

/// Pair chains with each other by closest centroids, closest first
fn pair_chains(centroids: &[(usize, DVec3)]) -> Vec<(usize, usize)> {
    let mut candidates = Vec::new();
    for (i, (_, p)) in centroids.iter().enumerate() {
        for (j, (_, q)) in centroids.iter().enumerate().skip(i + 1) {
            candidates.push((p.distance_squared(*q), i, j));
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut used = vec![false; centroids.len()];
    let mut pairs = Vec::new();
    for (_, i, j) in candidates {
        if used[i] || used[j] {
            continue;
        }
        used[i] = true;
        used[j] = true;
        pairs.push((centroids[i].0, centroids[j].0));
    }
    pairs
}

/// Connected components of the selection, linked through shared vertices
fn group_chains(mesh: &Mesh, edges: &[EdgeId]) -> Vec<Vec<EdgeId>> {
    let mut parent: Vec<usize> = (0..edges.len()).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut owner: HashMap<VertexId, usize> = HashMap::new();
    for (i, &e) in edges.iter().enumerate() {
        let Some((a, b)) = mesh.edge_endpoints(e) else {
            continue;
        };
        for v in [a, b] {
            match owner.get(&v) {
                Some(&j) => {
                    let (ri, rj) = (root(&mut parent, i), root(&mut parent, j));
                    parent[ri] = rj;
                }
                None => {
                    owner.insert(v, i);
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<EdgeId>> = HashMap::new();
    let mut order = Vec::new();
    for (i, &e) in edges.iter().enumerate() {
        let r = root(&mut parent, i);
        if !groups.contains_key(&r) {
            order.push(r);
        }
        groups.entry(r).or_default().push(e);
    }
    order
        .into_iter()
        .filter_map(|r| groups.remove(&r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::mesh::fixtures;
    use topology::{Face, Vertex};

    fn two_edges(mesh: &Mesh) -> (EdgeId, EdgeId) {
        let ids: Vec<EdgeId> = mesh.edge_ids().collect();
        (ids[0], ids[1])
    }

    #[test]
    fn test_bridge_edges_creates_two_vertices_two_faces() {
        let mut mesh = fixtures::parallel_edges();
        let (e1, e2) = two_edges(&mesh);

        let result = bridge_edges(&mut mesh, e1, e2, &BridgeOptions::default()).unwrap();

        assert_eq!(result.vertices_created, 2);
        assert_eq!(result.faces_created, 2);
        assert_eq!(result.edges_created, 5);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_bridge_edges_with_triangles() {
        let mut mesh = fixtures::parallel_edges();
        let (e1, e2) = two_edges(&mesh);
        let options = BridgeOptions {
            create_quads: false,
            ..Default::default()
        };

        let result = bridge_edges(&mut mesh, e1, e2, &options).unwrap();

        assert_eq!(result.vertices_created, 2);
        assert_eq!(result.faces_created, 4);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_midline_sits_between_paired_endpoints() {
        let mut mesh = fixtures::parallel_edges();
        let (e1, e2) = two_edges(&mesh);
        let result = bridge_edges(&mut mesh, e1, e2, &BridgeOptions::default()).unwrap();
        for v in result.new_vertices {
            let p = mesh.position(v).unwrap();
            assert!((p.y - 0.5).abs() < 1e-12, "midline at y = 0.5, got {p}");
        }
    }

    #[test]
    fn test_bridge_edge_to_itself_fails() {
        let mut mesh = fixtures::parallel_edges();
        let (e1, _) = two_edges(&mesh);
        let err = bridge_edges(&mut mesh, e1, e1, &BridgeOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Cannot bridge edge to itself"));
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_bridge_connected_edges_fails() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let edges = mesh.face(f).unwrap().edges().to_vec();
        let before = mesh.stats();
        let err = bridge_edges(&mut mesh, edges[0], edges[1], &BridgeOptions::default()).unwrap_err();
        assert!(err.to_string().contains("already connected"));
        assert_eq!(mesh.stats(), before);
    }

    #[test]
    fn test_bridge_edge_sequence_records_failures() {
        let mut mesh = fixtures::quad_grid(3, 3);
        let bottom: Vec<EdgeId> = mesh
            .edge_ids()
            .filter(|&e| {
                let (p, q) = mesh.edge_positions(e).unwrap();
                p.y == 0.0 && q.y == 0.0
            })
            .collect();
        let top: Vec<EdgeId> = mesh
            .edge_ids()
            .filter(|&e| {
                let (p, q) = mesh.edge_positions(e).unwrap();
                p.y == 3.0 && q.y == 3.0
            })
            .collect();
        assert_eq!(bottom.len(), 3);

        let mut second = top.clone();
        second[1] = bottom[1];
        let batch = bridge_edge_sequence(&mut mesh, &bottom, &second, &BridgeOptions::default());

        assert!(!batch.success);
        assert_eq!(batch.bridged, 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].index, 1);
        assert_eq!(batch.failures[0].error, "Cannot bridge edge to itself");
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_bridge_edge_sequence_rejects_bad_input() {
        let mut mesh = fixtures::parallel_edges();
        let (e1, e2) = two_edges(&mesh);
        let batch = bridge_edge_sequence(&mut mesh, &[], &[], &BridgeOptions::default());
        assert_eq!(batch.error.as_deref(), Some("No edges provided"));
        let batch = bridge_edge_sequence(&mut mesh, &[e1, e2], &[e2], &BridgeOptions::default());
        assert!(batch.error.unwrap().contains("differ in length"));
        assert_eq!(mesh.vertex_count(), 4);
    }

    fn stacked_quads() -> (Mesh, FaceId, FaceId) {
        let mut mesh = Mesh::new("stacked");
        let mut faces = Vec::new();
        for z in [0.0, 1.0] {
            let ids: Vec<VertexId> = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
                .iter()
                .map(|[x, y]| mesh.add_vertex(Vertex::new(DVec3::new(*x, *y, z))))
                .collect();
            faces.push(mesh.add_face(Face::new(ids)).unwrap());
        }
        (mesh, faces[0], faces[1])
    }

    #[test]
    fn test_bridge_faces_builds_band() {
        let (mut mesh, f1, f2) = stacked_quads();

        let result = bridge_faces(&mut mesh, f1, f2, &BridgeOptions::default()).unwrap();

        // One shared midline vertex per corner pair
        assert_eq!(result.vertices_created, 4);
        assert_eq!(result.faces_created, 8);
        assert!(validate_mesh(&mesh).is_valid);
        // Source faces stay in place as caps of the band
        assert!(mesh.face(f1).is_some());
        assert!(mesh.face(f2).is_some());
        assert_eq!(mesh.face_count(), 10);
        for v in result.new_vertices {
            assert!((mesh.position(v).unwrap().z - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bridge_faces_preconditions() {
        let (mut mesh, f1, _) = stacked_quads();
        let err = bridge_faces(&mut mesh, f1, f1, &BridgeOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot bridge face to itself");

        let mut grid = fixtures::quad_grid(2, 1);
        let ids: Vec<FaceId> = grid.face_ids().collect();
        let err = bridge_faces(&mut grid, ids[0], ids[1], &BridgeOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Faces are already connected");
    }

    #[test]
    fn test_bridge_selected_chains() {
        let mut mesh = Mesh::new("chains");
        let mut chain = |y: f64| -> Vec<EdgeId> {
            let ids: Vec<VertexId> = (0..3)
                .map(|x| mesh.add_vertex(Vertex::new(DVec3::new(x as f64, y, 0.0))))
                .collect();
            vec![
                mesh.connect(ids[0], ids[1]).unwrap(),
                mesh.connect(ids[1], ids[2]).unwrap(),
            ]
        };
        let mut selection = chain(0.0);
        selection.extend(chain(2.0));

        let batch = bridge_selected_edges(&mut mesh, &selection, &BridgeOptions::default());

        assert!(batch.success, "{:?}", batch);
        assert_eq!(batch.bridged, 1);
        assert_eq!(batch.vertices_created, 3);
        assert_eq!(batch.faces_created, 4);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_bridge_selected_needs_two_chains() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let edges = mesh.face(f).unwrap().edges().to_vec();
        let batch = bridge_selected_edges(&mut mesh, &edges, &BridgeOptions::default());
        assert!(!batch.success);
        assert!(batch.error.is_some());
    }

    #[test]
    fn test_greedy_match_pairs_closest() {
        let left = [(0usize, DVec3::ZERO), (1, DVec3::X * 10.0)];
        let right = [(0usize, DVec3::X * 9.0), (1, DVec3::X)];
        let pairs = greedy_match(&left, &right);
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }
}
