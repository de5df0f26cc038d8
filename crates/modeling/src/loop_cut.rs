//! Loop cut: insert parallel rings of edges across a quad ring.
//!
//! Loop cuts report through [`LoopCutResult`] instead of failing: a rejected
//! cut carries its message in `error` and leaves the mesh untouched.

use std::collections::HashSet;
use std::f64::consts::PI;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use topology::{
    EdgeId, FaceId, Mesh, MeshEdit, MeshStats, StagedFace, TopologyError, ValidationReport,
    VertexRef, validate_mesh,
};
use tracing::{debug, trace, warn};

use crate::edge_loop::{EdgeLoop, find_edge_loop};
use crate::error::{ModelingError, Result};

/// Configuration for loop cuts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopCutOptions {
    /// Number of parallel rings to insert (default: 1)
    pub cuts: u32,
    /// Bulge of the new rings along the vertex normals (default: 0.0)
    pub smoothing_factor: f64,
    /// Split the ring's quads; when false only vertices and edge chains are
    /// added (default: true)
    pub create_faces: bool,
    /// Attach a validation report to the result (default: false)
    pub validate: bool,
}

impl Default for LoopCutOptions {
    fn default() -> Self {
        Self {
            cuts: 1,
            smoothing_factor: 0.0,
            create_faces: true,
            validate: false,
        }
    }
}

/// Outcome of one loop cut
#[derive(Debug, Clone, Default)]
pub struct LoopCutResult {
    pub success: bool,
    /// Rings inserted (`cuts` on success)
    pub loops_cut: usize,
    pub vertices_created: usize,
    pub edges_created: usize,
    pub faces_created: usize,
    pub stats_before: MeshStats,
    pub stats_after: MeshStats,
    pub error: Option<String>,
    pub validation: Option<ValidationReport>,
}

impl LoopCutResult {
    fn failed(mesh: &Mesh, error: impl Into<String>) -> Self {
        let error = error.into();
        warn!("cut_edge_loop: {}", error);
        let stats = mesh.stats();
        Self {
            stats_before: stats,
            stats_after: stats,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Outcome of several loop cuts applied one after another
#[derive(Debug, Clone, Default)]
pub struct MultiLoopCutResult {
    /// True when every cut succeeded
    pub success: bool,
    pub results: Vec<LoopCutResult>,
    pub loops_cut: usize,
    pub vertices_created: usize,
    pub edges_created: usize,
    pub faces_created: usize,
    pub stats_before: MeshStats,
    pub stats_after: MeshStats,
    pub error: Option<String>,
}

impl MultiLoopCutResult {
    fn push(&mut self, result: LoopCutResult) {
        self.loops_cut += result.loops_cut;
        self.vertices_created += result.vertices_created;
        self.edges_created += result.edges_created;
        self.faces_created += result.faces_created;
        self.results.push(result);
    }
}

/// Cut the quad ring through `seed` with `options.cuts` parallel rings.
///
/// New vertices sit at `i / (cuts + 1)` along every ring edge, lifted along
/// the averaged endpoint normal by `smoothing_factor * sin(PI * t) * |edge| / 4`.
/// Each quad of the ring becomes `cuts + 1` quads (the first keeps the
/// original handle), and faces outside the ring that share a ring edge get
/// the new vertices inserted into their boundary.
pub fn cut_edge_loop(mesh: &mut Mesh, seed: EdgeId, options: &LoopCutOptions) -> LoopCutResult {
    trace!("cut_edge_loop: START seed={} cuts={}", seed, options.cuts);

    // ========================================================================
    // PHASE 1: GATHER (read-only, fail early)
    // ========================================================================
    if !mesh.contains_edge(seed) {
        return LoopCutResult::failed(mesh, "Invalid start edge index");
    }
    if options.cuts < 1 {
        return LoopCutResult::failed(mesh, "Number of cuts must be at least 1");
    }
    let Some(ring) = find_edge_loop(mesh, seed) else {
        return LoopCutResult::failed(mesh, "No valid edge loop found");
    };

    // ========================================================================
    // PHASE 2: STAGE
    // ========================================================================
    let edit = match stage_cut(mesh, &ring, options) {
        Ok(edit) => edit,
        Err(e) => return LoopCutResult::failed(mesh, format!("Loop cut failed: {}", e)),
    };

    // ========================================================================
    // PHASE 3: COMMIT
    // ========================================================================
    let stats_before = mesh.stats();
    let summary = match edit.commit(mesh) {
        Ok(summary) => summary,
        Err(e) => return LoopCutResult::failed(mesh, format!("Loop cut failed: {}", e)),
    };

    debug!(
        "cut_edge_loop: {} ring edges ({}), +{} vertices, +{} faces",
        ring.len(),
        if ring.closed { "closed" } else { "open" },
        summary.vertices.len(),
        summary.faces.len()
    );
    trace!("cut_edge_loop: END");

    LoopCutResult {
        success: true,
        loops_cut: options.cuts as usize,
        vertices_created: summary.vertices.len(),
        edges_created: summary.edges_created,
        faces_created: summary.faces.len(),
        stats_before,
        stats_after: mesh.stats(),
        error: None,
        validation: options.validate.then(|| validate_mesh(mesh)),
    }
}

/// Cut the ring through each seed in turn
pub fn cut_multiple_loops(
    mesh: &mut Mesh,
    seeds: &[EdgeId],
    options: &LoopCutOptions,
) -> MultiLoopCutResult {
    let mut out = MultiLoopCutResult {
        stats_before: mesh.stats(),
        ..Default::default()
    };
    if seeds.is_empty() {
        warn!("cut_multiple_loops: no seeds");
        out.stats_after = out.stats_before;
        out.error = Some("No edges provided".to_string());
        return out;
    }

    for &seed in seeds {
        out.push(cut_edge_loop(mesh, seed, options));
    }
    out.success = out.results.iter().all(|r| r.success);
    out.stats_after = mesh.stats();
    debug!(
        "cut_multiple_loops: {}/{} cuts succeeded",
        out.results.iter().filter(|r| r.success).count(),
        out.results.len()
    );
    out
}

/// Group a selection into quad rings and cut each ring once.
///
/// Grouping happens on the mesh as it is before the first cut; edges that
/// share a ring with an earlier selected edge are skipped.
pub fn cut_selected_loops(
    mesh: &mut Mesh,
    selection: &[EdgeId],
    options: &LoopCutOptions,
) -> MultiLoopCutResult {
    let mut covered: HashSet<EdgeId> = HashSet::new();
    let mut seeds = Vec::new();
    for &e in selection {
        if covered.contains(&e) {
            continue;
        }
        seeds.push(e);
        if let Some(ring) = find_edge_loop(mesh, e) {
            covered.extend(ring.edges.iter().map(|o| o.edge));
        }
    }
    trace!(
        "cut_selected_loops: {} selected edges in {} rings",
        selection.len(),
        seeds.len()
    );
    cut_multiple_loops(mesh, &seeds, options)
}

fn stage_cut(mesh: &Mesh, ring: &EdgeLoop, options: &LoopCutOptions) -> Result<MeshEdit> {
    let cuts = options.cuts as usize;
    let mut edit = MeshEdit::new();

    // Each ring edge as from, new vertices..., to
    let mut divided: Vec<Vec<VertexRef>> = Vec::with_capacity(ring.len());
    for o in &ring.edges {
        let p = mesh
            .position(o.from)
            .ok_or(TopologyError::VertexNotFound(o.from))?;
        let q = mesh
            .position(o.to)
            .ok_or(TopologyError::VertexNotFound(o.to))?;
        let normal = match (mesh.vertex_normal(o.from), mesh.vertex_normal(o.to)) {
            (Some(a), Some(b)) => (a + b).try_normalize().unwrap_or(DVec3::ZERO),
            (Some(n), None) | (None, Some(n)) => n,
            (None, None) => DVec3::ZERO,
        };
        let length = p.distance(q);

        let mut chain = Vec::with_capacity(cuts + 2);
        chain.push(VertexRef::Existing(o.from));
        for i in 1..=cuts {
            let t = i as f64 / (cuts + 1) as f64;
            let lift = normal * options.smoothing_factor * (PI * t).sin() * length / 4.0;
            chain.push(edit.add_vertex(p.lerp(q, t) + lift));
        }
        chain.push(VertexRef::Existing(o.to));
        divided.push(chain);
    }

    if !options.create_faces {
        for chain in &divided {
            for pair in chain.windows(2) {
                edit.add_edge(pair[0], pair[1]);
            }
        }
        return Ok(edit);
    }

    let n = ring.len();
    for (j, &f) in ring.faces.iter().enumerate() {
        let face = mesh.face(f).ok_or(TopologyError::FaceNotFound(f))?;
        let near = &ring.edges[j];
        let verts = face.vertices();
        let at = verts
            .iter()
            .position(|&v| v == near.from)
            .ok_or_else(|| ModelingError::Degenerate(format!("face {} left the ring", f)))?;
        let forward = verts[(at + 1) % verts.len()] == near.to;

        let a = &divided[j];
        let b = &divided[(j + 1) % n];
        for i in 0..=cuts {
            let mut quad = vec![a[i], a[i + 1], b[i + 1], b[i]];
            if !forward {
                quad.reverse();
            }
            if i == 0 {
                edit.rewire_face(f, quad);
            } else {
                edit.add_face(
                    StagedFace::new(quad)
                        .with_material(face.material_index)
                        .with_user_data(face.user_data.clone()),
                );
            }
        }
    }

    // Faces across a ring edge from outside the ring
    let ring_faces: HashSet<FaceId> = ring.faces.iter().copied().collect();
    let mut outside: Vec<(FaceId, Vec<usize>)> = Vec::new();
    for (k, o) in ring.edges.iter().enumerate() {
        for &g in mesh.faces_of_edge(o.edge) {
            if ring_faces.contains(&g) {
                continue;
            }
            match outside.iter_mut().find(|(h, _)| *h == g) {
                Some((_, ks)) => ks.push(k),
                None => outside.push((g, vec![k])),
            }
        }
    }
    for (g, ks) in outside {
        let face = mesh.face(g).ok_or(TopologyError::FaceNotFound(g))?;
        let verts = face.vertices();
        let m = verts.len();
        let mut out = Vec::with_capacity(m + ks.len() * cuts);
        for i in 0..m {
            let here = verts[i];
            let next = verts[(i + 1) % m];
            out.push(VertexRef::Existing(here));
            for &k in &ks {
                let o = &ring.edges[k];
                let inner = &divided[k][1..=cuts];
                if here == o.from && next == o.to {
                    out.extend(inner.iter().copied());
                } else if here == o.to && next == o.from {
                    out.extend(inner.iter().rev().copied());
                }
            }
        }
        edit.rewire_face(g, out);
    }

    for o in &ring.edges {
        edit.remove_edge(o.edge);
    }
    Ok(edit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use topology::Face;
    use topology::mesh::fixtures;

    fn vertical_edge(mesh: &Mesh) -> EdgeId {
        mesh.edge_ids()
            .find(|&e| {
                let (p, q) = mesh.edge_positions(e).unwrap();
                (q - p).z.abs() > 0.5
            })
            .unwrap()
    }

    #[test]
    fn test_single_cut_on_tube() {
        let mut mesh = fixtures::tube(8, 1);
        let seed = vertical_edge(&mesh);

        let result = cut_edge_loop(&mut mesh, seed, &LoopCutOptions::default());

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.loops_cut, 1);
        assert_eq!(result.vertices_created, 8);
        assert_eq!(result.faces_created, 8);
        assert_eq!(result.stats_before.edges, 24);
        assert_eq!(result.stats_after.edges, 40);
        assert_eq!(mesh.face_count(), 16);
        assert!(mesh.edge(seed).is_none());
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_cut_count_matches_ring_length() {
        let mut mesh = fixtures::tube(6, 2);
        let seed = vertical_edge(&mesh);
        let options = LoopCutOptions {
            cuts: 3,
            validate: true,
            ..Default::default()
        };

        let result = cut_edge_loop(&mut mesh, seed, &options);

        assert!(result.success);
        assert_eq!(result.loops_cut, 3);
        assert_eq!(result.vertices_created, 3 * 6);
        assert_eq!(result.faces_created, 3 * 6);
        assert!(result.validation.unwrap().is_valid);
    }

    #[test]
    fn test_stale_seed_is_reported() {
        let mut mesh = fixtures::cube();
        let seed = mesh.edge_ids().next().unwrap();
        mesh.remove_edge(seed).unwrap();
        let before = mesh.stats();

        let result = cut_edge_loop(&mut mesh, seed, &LoopCutOptions::default());

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid start edge index"));
        assert_eq!(mesh.stats(), before);
    }

    #[test]
    fn test_zero_cuts_rejected() {
        let mut mesh = fixtures::cube();
        let seed = mesh.edge_ids().next().unwrap();
        let options = LoopCutOptions {
            cuts: 0,
            ..Default::default()
        };
        let result = cut_edge_loop(&mut mesh, seed, &options);
        assert_eq!(
            result.error.as_deref(),
            Some("Number of cuts must be at least 1")
        );
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_triangles_have_no_loop() {
        let mut mesh = fixtures::tetrahedron();
        let seed = mesh.edge_ids().next().unwrap();
        let result = cut_edge_loop(&mut mesh, seed, &LoopCutOptions::default());
        assert_eq!(result.error.as_deref(), Some("No valid edge loop found"));
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_outside_face_receives_new_vertex() {
        let mut mesh = fixtures::quad_grid(2, 1);
        let right = mesh
            .edge_ids()
            .find(|&e| {
                let (p, q) = mesh.edge_positions(e).unwrap();
                p.x == 2.0 && q.x == 2.0
            })
            .unwrap();
        let (a, b) = mesh.edge_endpoints(right).unwrap();
        let apex = mesh.add_vertex(DVec3::new(3.0, 0.5, 0.0).into());
        let tri = mesh.add_face(Face::new(vec![b, a, apex])).unwrap();
        let seed = vertical_edge_in_plane(&mesh, 0.0);

        let result = cut_edge_loop(&mut mesh, seed, &LoopCutOptions::default());

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.vertices_created, 3);
        assert_eq!(result.faces_created, 2);
        assert_eq!(mesh.face(tri).unwrap().len(), 4);
        let report = validate_mesh(&mesh);
        assert!(report.is_valid, "{:?}", report.issues);
    }

    fn vertical_edge_in_plane(mesh: &Mesh, x: f64) -> EdgeId {
        mesh.edge_ids()
            .find(|&e| {
                let (p, q) = mesh.edge_positions(e).unwrap();
                p.x == x && q.x == x
            })
            .unwrap()
    }

    #[test]
    fn test_open_grid_ring() {
        let mut mesh = fixtures::quad_grid(3, 2);
        let seed = vertical_edge_in_plane(&mesh, 1.0);
        let result = cut_edge_loop(&mut mesh, seed, &LoopCutOptions::default());
        assert!(result.success);
        // Seed ring runs along x across one row of three quads
        assert_eq!(result.vertices_created, 4);
        assert_eq!(mesh.face_count(), 9);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_without_faces_only_chains() {
        let mut mesh = fixtures::tube(4, 1);
        let seed = vertical_edge(&mesh);
        let options = LoopCutOptions {
            create_faces: false,
            ..Default::default()
        };

        let result = cut_edge_loop(&mut mesh, seed, &options);

        assert!(result.success);
        assert_eq!(result.vertices_created, 4);
        assert_eq!(result.faces_created, 0);
        assert_eq!(result.edges_created, 8);
        assert_eq!(mesh.face_count(), 4);
        assert!(mesh.edge(seed).is_some());
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_smoothing_pushes_ring_outward() {
        let mut mesh = fixtures::tube(8, 1);
        let seed = vertical_edge(&mesh);
        let options = LoopCutOptions {
            smoothing_factor: 1.0,
            ..Default::default()
        };
        let before: HashSet<_> = mesh.vertex_ids().collect();

        let result = cut_edge_loop(&mut mesh, seed, &options);

        assert!(result.success);
        for v in mesh.vertex_ids().filter(|v| !before.contains(v)) {
            let p = mesh.position(v).unwrap();
            assert_relative_eq!(p.z, 0.5, epsilon = 1e-12);
            // Radius 1 plus sin(PI / 2) * 1 / 4
            assert_relative_eq!(p.truncate().length(), 1.25, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_multiple_loops_on_cube() {
        let mut mesh = fixtures::cube();
        let v0 = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Some(DVec3::ZERO))
            .unwrap();
        let vertical = mesh
            .edges_of_vertex(v0)
            .iter()
            .copied()
            .find(|&e| mesh.edge_positions(e).is_some_and(|(p, q)| (q - p).z.abs() > 0.5))
            .unwrap();
        let along_x = mesh
            .edges_of_vertex(v0)
            .iter()
            .copied()
            .find(|&e| mesh.edge_positions(e).is_some_and(|(p, q)| (q - p).x.abs() > 0.5))
            .unwrap();

        let result = cut_multiple_loops(&mut mesh, &[vertical, along_x], &LoopCutOptions::default());

        assert!(result.success);
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.loops_cut, 2);
        assert_eq!(result.results[0].vertices_created, 4);
        // Second ring crosses the first cut on two faces
        assert_eq!(result.results[1].vertices_created, 6);
        assert_eq!(result.stats_before.vertices, 8);
        assert_eq!(result.stats_after.vertices, 18);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_selected_edges_on_one_ring_cut_once() {
        let mut mesh = fixtures::tube(8, 1);
        let selection: Vec<EdgeId> = mesh
            .edge_ids()
            .filter(|&e| {
                let (p, q) = mesh.edge_positions(e).unwrap();
                (q - p).z.abs() > 0.5
            })
            .take(3)
            .collect();

        let result = cut_selected_loops(&mut mesh, &selection, &LoopCutOptions::default());

        assert!(result.success);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.vertices_created, 8);
    }

    #[test]
    fn test_no_seeds() {
        let mut mesh = fixtures::cube();
        let result = cut_multiple_loops(&mut mesh, &[], &LoopCutOptions::default());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("No edges provided"));
    }
}
