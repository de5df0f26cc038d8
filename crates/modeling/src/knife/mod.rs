//! Knife operator: cut faces along a polyline, a set of lines or a circle.
//!
//! Each cut is staged as one [`MeshEdit`]. The knife reports through
//! [`KnifeResult`] and never returns an error; cuts committed before a failing
//! cut stay applied.

mod intersect;
mod split;

use std::collections::HashMap;
use std::f64::consts::TAU;

use glam::DVec3;
use polyforge_config::{DEFAULT_EPSILON, DEFAULT_KNIFE_TOLERANCE, DEFAULT_MERGE_TOLERANCE, ToleranceConfig};
use serde::{Deserialize, Serialize};
use topology::geometry::perpendicular;
use topology::{
    EdgeId, FaceId, Mesh, MeshEdit, StagedFace, TopologyError, ValidationReport, Vertex,
    VertexRef, validate_mesh,
};
use tracing::{debug, trace, warn};

use crate::error::Result;
use intersect::{Hit, HitTarget, collect_hits};
use split::{EdgeInserts, loop_with_inserts, nearest_far_corner, split_along};

/// Configuration for knife cuts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnifeOptions {
    /// Insert vertices where the path crosses edges; when false only existing
    /// vertices on the path are used (default: true)
    pub create_vertices: bool,
    /// Split faces along the cut (default: true)
    pub split_faces: bool,
    /// Join consecutive cut vertices that share a face with edges (default: true)
    pub create_edges: bool,
    /// Fill the polygon of a closed cut with a triangle fan (default: false)
    pub fill_holes: bool,
    /// Weld coincident vertices after cutting (default: true)
    pub merge_vertices: bool,
    /// Treat the path as a closed polygon (default: false)
    pub closed: bool,
    /// Intersection distance for snapping the path to edges and vertices (default: 1e-6)
    pub tolerance: f64,
    /// Welding grid size for `merge_vertices` (default: 1e-6)
    pub merge_tolerance: f64,
    /// Attach a validation report to the result (default: false)
    pub validate: bool,
}

impl Default for KnifeOptions {
    fn default() -> Self {
        Self {
            create_vertices: true,
            split_faces: true,
            create_edges: true,
            fill_holes: false,
            merge_vertices: true,
            closed: false,
            tolerance: DEFAULT_KNIFE_TOLERANCE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            validate: false,
        }
    }
}

impl KnifeOptions {
    /// Default options with the intersection and welding distances taken
    /// from `config`
    pub fn with_tolerances(config: &ToleranceConfig) -> Self {
        Self {
            tolerance: config.intersection,
            merge_tolerance: config.merge,
            ..Default::default()
        }
    }

    fn tolerances(&self) -> ToleranceConfig {
        ToleranceConfig {
            epsilon: DEFAULT_EPSILON,
            intersection: self.tolerance,
            merge: self.merge_tolerance,
        }
    }
}

/// A straight cut between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnifeLine {
    pub start: DVec3,
    pub end: DVec3,
}

impl KnifeLine {
    pub fn new(start: DVec3, end: DVec3) -> Self {
        Self { start, end }
    }
}

/// What a single cut added
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CutStats {
    pub vertices_created: usize,
    pub edges_created: usize,
    pub faces_split: usize,
}

/// Outcome of a knife operation
#[derive(Debug, Clone, Default)]
pub struct KnifeResult {
    pub success: bool,
    /// One entry per committed cut
    pub cuts: Vec<CutStats>,
    pub vertices_merged: usize,
    pub error: Option<String>,
    pub validation: Option<ValidationReport>,
}

impl KnifeResult {
    fn rejected(error: impl Into<String>) -> Self {
        let error = error.into();
        warn!("knife: rejected: {}", error);
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn vertices_created(&self) -> usize {
        self.cuts.iter().map(|c| c.vertices_created).sum()
    }

    pub fn faces_split(&self) -> usize {
        self.cuts.iter().map(|c| c.faces_split).sum()
    }
}

/// Cut along `path`, closed back to its first point when `options.closed`
pub fn knife_cut(mesh: &mut Mesh, path: &[DVec3], options: &KnifeOptions) -> KnifeResult {
    if path.len() < 2 {
        return KnifeResult::rejected("Cut path needs at least two points");
    }
    run_cuts(mesh, &[(path, options.closed)], options, "knife_cut")
}

/// One open cut per line, applied in order
pub fn knife_cut_lines(mesh: &mut Mesh, lines: &[KnifeLine], options: &KnifeOptions) -> KnifeResult {
    if lines.is_empty() {
        return KnifeResult::rejected("No cut lines provided");
    }
    let paths: Vec<[DVec3; 2]> = lines.iter().map(|l| [l.start, l.end]).collect();
    let cuts: Vec<(&[DVec3], bool)> = paths.iter().map(|p| (&p[..], false)).collect();
    run_cuts(mesh, &cuts, options, "knife_cut_lines")
}

/// Closed cut along a regular polygon of `segments` points on a circle
pub fn knife_circle(
    mesh: &mut Mesh,
    center: DVec3,
    normal: DVec3,
    radius: f64,
    segments: usize,
    options: &KnifeOptions,
) -> KnifeResult {
    if !(radius.is_finite() && radius > 0.0) {
        return KnifeResult::rejected("Circle radius must be positive");
    }
    if segments < 3 {
        return KnifeResult::rejected("Circle needs at least three segments");
    }
    let Some(axis) = normal.try_normalize() else {
        return KnifeResult::rejected("Circle normal must be non-zero");
    };
    let Some(u) = perpendicular(axis) else {
        return KnifeResult::rejected("Circle normal must be non-zero");
    };
    let w = axis.cross(u);

    let points: Vec<DVec3> = (0..segments)
        .map(|i| {
            let angle = TAU * i as f64 / segments as f64;
            center + (u * angle.cos() + w * angle.sin()) * radius
        })
        .collect();
    run_cuts(mesh, &[(points.as_slice(), true)], options, "knife_circle")
}

fn run_cuts(
    mesh: &mut Mesh,
    cuts: &[(&[DVec3], bool)],
    options: &KnifeOptions,
    label: &str,
) -> KnifeResult {
    trace!("{}: START {} cut(s)", label, cuts.len());

    if !options.tolerances().is_valid() {
        return KnifeResult::rejected("Invalid tolerance");
    }
    if !validate_mesh(mesh).is_valid {
        return KnifeResult::rejected("Invalid mesh");
    }

    let mut result = KnifeResult::default();
    for (index, &(path, closed)) in cuts.iter().enumerate() {
        match cut_once(mesh, path, closed, options) {
            Ok(stats) => result.cuts.push(stats),
            Err(e) => {
                warn!("{}: cut {} failed: {}", label, index, e);
                result.error = Some(format!("Knife cut failed: {}", e));
                break;
            }
        }
    }

    if options.merge_vertices && result.error.is_none() {
        match mesh.merge_by_distance(options.merge_tolerance) {
            Ok(merged) => result.vertices_merged = merged,
            Err(e) => result.error = Some(format!("Knife cut failed: {}", e)),
        }
    }

    result.success = result.error.is_none();
    if options.validate {
        result.validation = Some(validate_mesh(mesh));
    }
    debug!(
        "{}: {} cut(s), +{} vertices, {} faces split, {} merged",
        label,
        result.cuts.len(),
        result.vertices_created(),
        result.faces_split(),
        result.vertices_merged
    );
    result
}

fn cut_once(mesh: &mut Mesh, path: &[DVec3], closed: bool, options: &KnifeOptions) -> Result<CutStats> {
    // ========================================================================
    // PHASE 1: GATHER (read-only, fail early)
    // ========================================================================
    let mut hits = collect_hits(mesh, path, closed, options.tolerance);
    if !options.create_vertices {
        hits.retain(|h| matches!(h.target, HitTarget::Vertex(_)));
    }

    let mut edit = MeshEdit::new();
    if hits.is_empty() {
        if !closed {
            trace!("cut_once: path misses the mesh");
            return Ok(CutStats::default());
        }
        seed_path(&mut edit, path, options);
        let summary = edit.commit(mesh)?;
        return Ok(CutStats {
            vertices_created: summary.vertices.len(),
            edges_created: summary.edges_created,
            faces_split: 0,
        });
    }

    // ========================================================================
    // PHASE 2: STAGE cut vertices
    // ========================================================================
    let mut chain: Vec<VertexRef> = Vec::with_capacity(hits.len());
    let mut touching: Vec<Vec<FaceId>> = Vec::with_capacity(hits.len());
    let mut inserts = EdgeInserts::new();
    for hit in &hits {
        let (v, faces) = match hit.target {
            HitTarget::Vertex(v) => (VertexRef::Existing(v), mesh.faces_of_vertex(v)),
            HitTarget::Edge { edge, t } => {
                let v = edit.add_vertex(vertex_on_edge(mesh, edge, t, hit)?);
                inserts.entry(edge).or_default().push((t, v));
                (v, mesh.faces_of_edge(edge).to_vec())
            }
        };
        chain.push(v);
        touching.push(faces);
    }
    for along in inserts.values_mut() {
        along.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let mut path_index: HashMap<VertexRef, usize> = HashMap::new();
    for (i, &v) in chain.iter().enumerate() {
        path_index.entry(v).or_insert(i);
    }
    let wraps = closed && chain.len() > 2;
    let consecutive = |i: usize, j: usize| j == i + 1 || (wraps && i == 0 && j == chain.len() - 1);

    // ========================================================================
    // PHASE 3: STAGE face splits
    // ========================================================================
    let mut affected: Vec<FaceId> = Vec::new();
    for &f in touching.iter().flatten() {
        if !affected.contains(&f) {
            affected.push(f);
        }
    }

    let mut faces_split = 0;
    for &f in &affected {
        let face = mesh.face(f).ok_or(TopologyError::FaceNotFound(f))?;
        let boundary = loop_with_inserts(mesh, face, &inserts);
        let grew = boundary.len() != face.len();
        let mut polygons = vec![boundary];

        if options.split_faces {
            let mut on_face: Vec<usize> = polygons[0]
                .iter()
                .filter_map(|v| path_index.get(v).copied())
                .collect();
            on_face.sort_unstable();

            let mut chords = Vec::new();
            for (x, &i) in on_face.iter().enumerate() {
                for &j in &on_face[x + 1..] {
                    if consecutive(i, j) {
                        chords.push((chain[i], chain[j]));
                    }
                }
            }
            // Only one new cut vertex lies on this face, whether the path ends
            // inside it or just crosses one of its edges: split to the nearest corner
            if let &[only] = on_face.as_slice() {
                if matches!(chain[only], VertexRef::Staged(_)) {
                    let corners: Vec<VertexRef> = face.vertices().iter().map(|&v| v.into()).collect();
                    if let Some(corner) = nearest_far_corner(mesh, &edit, &polygons[0], chain[only], &corners) {
                        chords.push((chain[only], corner));
                    }
                }
            }

            for (a, b) in chords {
                if !split_along(&mut polygons, a, b) {
                    trace!("cut_once: chord skipped in face {}", f);
                }
            }
        }

        if polygons.len() > 1 {
            faces_split += 1;
        } else if !grew {
            continue;
        }
        let mut pieces = polygons.into_iter();
        if let Some(first) = pieces.next() {
            edit.rewire_face(f, first);
        }
        for piece in pieces {
            edit.add_face(
                StagedFace::new(piece)
                    .with_material(face.material_index)
                    .with_user_data(face.user_data.clone()),
            );
        }
    }

    // Hit edges give way to their sub-edges
    let mut hit_edges: Vec<EdgeId> = inserts.keys().copied().collect();
    hit_edges.sort_unstable();
    for e in hit_edges {
        let edge = mesh.edge(e).ok_or(TopologyError::EdgeNotFound(e))?;
        let mut prev = VertexRef::Existing(edge.v1);
        for &(_, v) in inserts.get(&e).into_iter().flatten() {
            edit.add_edge_with_user_data(prev, v, edge.user_data.clone());
            prev = v;
        }
        edit.add_edge_with_user_data(prev, edge.v2, edge.user_data.clone());
        edit.remove_edge(e);
    }

    if options.create_edges {
        for i in 0..chain.len() {
            let j = if i + 1 < chain.len() {
                i + 1
            } else if wraps {
                0
            } else {
                break;
            };
            let share_face = touching[i].iter().any(|f| touching[j].contains(f));
            if chain[i] != chain[j] && share_face {
                edit.add_edge(chain[i], chain[j]);
            }
        }
    }

    if options.fill_holes && closed {
        fan(&mut edit, &chain);
    }

    // ========================================================================
    // PHASE 4: COMMIT
    // ========================================================================
    let summary = edit.commit(mesh)?;
    trace!(
        "cut_once: {} hits, {} faces split, +{} vertices",
        hits.len(),
        faces_split,
        summary.vertices.len()
    );
    Ok(CutStats {
        vertices_created: summary.vertices.len(),
        edges_created: summary.edges_created,
        faces_split,
    })
}

/// A cut vertex on `edge` at parameter `t`, carrying interpolated attributes
fn vertex_on_edge(mesh: &Mesh, edge: EdgeId, t: f64, hit: &Hit) -> Result<Vertex> {
    let e = mesh.edge(edge).ok_or(TopologyError::EdgeNotFound(edge))?;
    let a = mesh.vertex(e.v1).ok_or(TopologyError::VertexNotFound(e.v1))?;
    let b = mesh.vertex(e.v2).ok_or(TopologyError::VertexNotFound(e.v2))?;

    let mut vertex = Vertex::new(hit.point);
    if let (Some(na), Some(nb)) = (a.normal, b.normal) {
        vertex.normal = na.lerp(nb, t).try_normalize();
    }
    if let (Some(ua), Some(ub)) = (a.uv, b.uv) {
        vertex.uv = Some(ua.lerp(ub, t));
    }
    Ok(vertex)
}

/// Vertices at the path points of a closed cut that crossed nothing
fn seed_path(edit: &mut MeshEdit, path: &[DVec3], options: &KnifeOptions) {
    let seeded: Vec<VertexRef> = path.iter().map(|&p| edit.add_vertex(p)).collect();
    if options.create_edges {
        for pair in seeded.windows(2) {
            edit.add_edge(pair[0], pair[1]);
        }
        if seeded.len() > 2 {
            edit.add_edge(seeded[seeded.len() - 1], seeded[0]);
        }
    }
    if options.fill_holes {
        fan(edit, &seeded);
    }
}

/// Triangle fan from the first vertex of a closed chain
fn fan(edit: &mut MeshEdit, chain: &[VertexRef]) {
    let Some((&hub, rest)) = chain.split_first() else {
        return;
    };
    for pair in rest.windows(2) {
        if pair[0] != hub && pair[1] != hub && pair[0] != pair[1] {
            edit.add_face(StagedFace::new([hub, pair[0], pair[1]]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyforge_config::DEFAULT_CIRCLE_SEGMENTS;
    use topology::mesh::fixtures;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> [DVec3; 2] {
        [DVec3::new(x0, y0, 0.0), DVec3::new(x1, y1, 0.0)]
    }

    #[test]
    fn test_cut_across_grid_column() {
        let mut mesh = fixtures::quad_grid(2, 2);

        let result = knife_cut(&mut mesh, &line(0.5, -0.5, 0.5, 2.5), &KnifeOptions::default());

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.cuts.len(), 1);
        let stats = result.cuts[0];
        assert_eq!(stats.vertices_created, 3);
        assert_eq!(stats.faces_split, 2);
        assert_eq!(stats.edges_created, 8);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.edge_count(), 17);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_single_quad_split_in_two() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let result = knife_cut(&mut mesh, &line(-0.5, 0.25, 1.5, 0.25), &KnifeOptions::default());
        assert!(result.success);
        assert_eq!(result.faces_split(), 1);
        assert_eq!(mesh.face_count(), 2);
        for (_, face) in mesh.faces() {
            assert_eq!(face.len(), 4);
        }
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_path_ending_inside_splits_to_nearest_corner() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let result = knife_cut(&mut mesh, &line(0.5, -0.5, 0.5, 0.5), &KnifeOptions::default());
        assert!(result.success);
        assert_eq!(result.vertices_created(), 1);
        assert_eq!(result.faces_split(), 1);
        let mut sizes: Vec<usize> = mesh.faces().map(|(_, f)| f.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 4]);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_single_crossing_splits_both_neighbours() {
        let mut mesh = fixtures::quad_grid(2, 1);
        // Both ends lie inside faces; the only crossing is the shared edge
        let result = knife_cut(&mut mesh, &line(0.5, 0.5, 1.5, 0.5), &KnifeOptions::default());
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.vertices_created(), 1);
        assert_eq!(result.faces_split(), 2);
        let mut sizes: Vec<usize> = mesh.faces().map(|(_, f)| f.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3, 4, 4]);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_cut_along_existing_edges_adds_nothing() {
        let mut mesh = fixtures::quad_grid(2, 1);
        let before = mesh.stats();
        let result = knife_cut(&mut mesh, &line(1.0, -0.5, 1.0, 1.5), &KnifeOptions::default());
        assert!(result.success);
        assert_eq!(result.vertices_created(), 0);
        assert_eq!(result.faces_split(), 0);
        assert_eq!(mesh.stats(), before);
    }

    #[test]
    fn test_split_faces_off_only_inserts() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let options = KnifeOptions {
            split_faces: false,
            create_edges: false,
            ..Default::default()
        };
        let result = knife_cut(&mut mesh, &line(-0.5, 0.25, 1.5, 0.25), &options);
        assert!(result.success);
        assert_eq!(result.vertices_created(), 2);
        assert_eq!(mesh.face_count(), 1);
        let f = mesh.face_ids().next().unwrap();
        assert_eq!(mesh.face(f).unwrap().len(), 6);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_circle_cut() {
        let mut mesh = fixtures::quad_grid(4, 4);
        let faces_before = mesh.face_count();
        let options = KnifeOptions {
            validate: true,
            ..Default::default()
        };

        let result = knife_circle(
            &mut mesh,
            DVec3::new(2.0, 2.0, 0.0),
            DVec3::Z,
            1.5,
            DEFAULT_CIRCLE_SEGMENTS,
            &options,
        );

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.cuts.len(), 1);
        assert!(result.vertices_created() > 0);
        assert!(result.faces_split() > 0);
        assert!(mesh.face_count() > faces_before);
        assert!(result.validation.unwrap().is_valid);
    }

    #[test]
    fn test_closed_path_in_empty_space_seeds_polygon() {
        let mut mesh = Mesh::new("empty");
        let options = KnifeOptions {
            closed: true,
            fill_holes: true,
            ..Default::default()
        };
        let path = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::Y,
        ];

        let result = knife_cut(&mut mesh, &path, &options);

        assert!(result.success);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edge_count(), 5);
        assert_eq!(mesh.face_count(), 2);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_cut_lines_one_cut_each() {
        let mut mesh = fixtures::quad_grid(2, 2);
        let lines = [
            KnifeLine::new(DVec3::new(0.5, -0.5, 0.0), DVec3::new(0.5, 2.5, 0.0)),
            KnifeLine::new(DVec3::new(1.5, -0.5, 0.0), DVec3::new(1.5, 2.5, 0.0)),
        ];
        let result = knife_cut_lines(&mut mesh, &lines, &KnifeOptions::default());
        assert!(result.success);
        assert_eq!(result.cuts.len(), 2);
        assert_eq!(mesh.face_count(), 8);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_wire_edges_are_split() {
        let mut mesh = fixtures::parallel_edges();
        let result = knife_cut(&mut mesh, &line(0.5, -1.0, 0.5, 2.0), &KnifeOptions::default());
        assert!(result.success);
        assert_eq!(result.vertices_created(), 2);
        assert_eq!(mesh.edge_count(), 4);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_rejected_inputs() {
        let mut mesh = fixtures::cube();
        let result = knife_cut(&mut mesh, &[DVec3::ZERO], &KnifeOptions::default());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Cut path needs at least two points"));

        let result = knife_cut_lines(&mut mesh, &[], &KnifeOptions::default());
        assert_eq!(result.error.as_deref(), Some("No cut lines provided"));

        let result = knife_circle(&mut mesh, DVec3::ZERO, DVec3::Z, 0.0, 8, &KnifeOptions::default());
        assert!(!result.success);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_uv_is_interpolated() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let ids: Vec<_> = mesh.vertex_ids().collect();
        for &v in &ids {
            let p = mesh.position(v).unwrap();
            mesh.vertex_mut(v).unwrap().uv = Some(p.truncate());
        }
        knife_cut(&mut mesh, &line(0.25, -0.5, 0.25, 1.5), &KnifeOptions::default());
        let new: Vec<_> = mesh.vertex_ids().filter(|v| !ids.contains(v)).collect();
        assert_eq!(new.len(), 2);
        for v in new {
            let vertex = mesh.vertex(v).unwrap();
            let uv = vertex.uv.unwrap();
            assert!((uv.x - 0.25).abs() < 1e-12);
            assert!((uv.y - vertex.position.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_merge_uses_its_own_tolerance() {
        let build = || {
            let mut mesh = fixtures::quad_grid(1, 1);
            mesh.add_vertex(Vertex::new(DVec3::new(1e-4, 0.0, 0.0)));
            mesh
        };
        let cut = line(-0.5, 0.25, 1.5, 0.25);

        let mut mesh = build();
        let result = knife_cut(&mut mesh, &cut, &KnifeOptions::default());
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.vertices_merged, 0);
        assert_eq!(mesh.vertex_count(), 7);

        let mut mesh = build();
        let options = KnifeOptions {
            merge_tolerance: 1e-3,
            ..Default::default()
        };
        let result = knife_cut(&mut mesh, &cut, &options);
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.vertices_merged, 1);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_options_from_tolerance_config() {
        let config = ToleranceConfig {
            epsilon: DEFAULT_EPSILON,
            intersection: 1e-4,
            merge: 1e-2,
        };
        let options = KnifeOptions::with_tolerances(&config);
        assert_eq!(options.tolerance, 1e-4);
        assert_eq!(options.merge_tolerance, 1e-2);
        assert!(options.split_faces);

        let mut mesh = fixtures::quad_grid(1, 1);
        let bad = KnifeOptions {
            merge_tolerance: f64::NAN,
            ..Default::default()
        };
        let result = knife_cut(&mut mesh, &line(-0.5, 0.25, 1.5, 0.25), &bad);
        assert_eq!(result.error.as_deref(), Some("Invalid tolerance"));
        assert_eq!(mesh.face_count(), 1);
    }
}
