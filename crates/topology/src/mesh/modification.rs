//! Collapse, weld and whole-mesh attribute updates.
//!
//! These operate on the store directly instead of going through
//! [`MeshEdit`](super::MeshEdit) because they retarget references in place:
//! faces that survive a collapse keep their handles.

use std::collections::HashMap;

use glam::DVec3;
use tracing::{debug, trace};

use super::Mesh;
use crate::types::{EdgeId, FaceId, Result, TopologyError, VertexId};

/// What an edge collapse changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseOutcome {
    /// The surviving endpoint
    pub kept: VertexId,
    /// The endpoint that was merged away
    pub removed: VertexId,
    pub faces_removed: usize,
    pub edges_removed: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct RetargetStats {
    faces_removed: usize,
    edges_removed: usize,
}

impl Mesh {
    /// Collapse an edge, moving its first endpoint to `position` and merging
    /// the second into it.
    ///
    /// Faces reduced below 3 distinct corners are removed, as are the collapsed
    /// edge and any edge that would duplicate an existing one. Normals and UVs
    /// of the survivor become the average of both endpoints.
    pub fn collapse_edge(&mut self, edge: EdgeId, position: DVec3) -> Result<CollapseOutcome> {
        trace!("collapse_edge: START edge={}", edge);

        // ====================================================================
        // PHASE 1: GATHER (read-only, fail early)
        // ====================================================================
        let (kept, removed) = self
            .edge_endpoints(edge)
            .ok_or(TopologyError::EdgeNotFound(edge))?;
        let keep_vertex = self.vertex(kept).ok_or(TopologyError::VertexNotFound(kept))?;
        let gone_vertex = self
            .vertex(removed)
            .ok_or(TopologyError::VertexNotFound(removed))?;

        let normal = match (keep_vertex.normal, gone_vertex.normal) {
            (Some(a), Some(b)) => (a + b).try_normalize().or(Some(a)),
            (a, b) => a.or(b),
        };
        let uv = match (keep_vertex.uv, gone_vertex.uv) {
            (Some(a), Some(b)) => Some((a + b) * 0.5),
            (a, b) => a.or(b),
        };

        // ====================================================================
        // PHASE 2: REWIRE
        // ====================================================================
        if let Some(v) = self.vertex_mut(kept) {
            v.position = position;
            v.normal = normal;
            v.uv = uv;
        }
        let stats = self.retarget_vertex(removed, kept)?;

        trace!(
            "collapse_edge: END kept={} removed={} faces_removed={}",
            kept, removed, stats.faces_removed
        );
        Ok(CollapseOutcome {
            kept,
            removed,
            faces_removed: stats.faces_removed,
            edges_removed: stats.edges_removed,
        })
    }

    /// Weld vertices whose positions fall into the same cell of a grid with
    /// spacing `tolerance`. Returns the number of vertices removed.
    ///
    /// Each duplicate is merged onto the first vertex (slot order) of its cell.
    pub fn merge_by_distance(&mut self, tolerance: f64) -> Result<usize> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Ok(0);
        }

        let quantize = |p: DVec3| -> (i64, i64, i64) {
            (
                (p.x / tolerance).round() as i64,
                (p.y / tolerance).round() as i64,
                (p.z / tolerance).round() as i64,
            )
        };

        let mut cells: HashMap<(i64, i64, i64), VertexId> = HashMap::new();
        let mut duplicates = Vec::new();
        for (id, v) in self.vertices.iter() {
            match cells.get(&quantize(v.position)) {
                Some(&first) => duplicates.push((id, first)),
                None => {
                    cells.insert(quantize(v.position), id);
                }
            }
        }

        for &(dup, target) in &duplicates {
            self.retarget_vertex(dup, target)?;
        }

        if !duplicates.is_empty() {
            debug!(
                "merge_by_distance: welded {} vertices (tolerance {})",
                duplicates.len(),
                tolerance
            );
        }
        Ok(duplicates.len())
    }

    /// Replace every reference to `from` with `to`, then delete `from`.
    fn retarget_vertex(&mut self, from: VertexId, to: VertexId) -> Result<RetargetStats> {
        let edges_before = self.edges.len();
        let mut stats = RetargetStats::default();

        // Faces: compute the remapped loop, drop the ones that degenerate
        let mut remapped: Vec<(FaceId, Vec<VertexId>)> = Vec::new();
        for f in self.faces_of_vertex(from) {
            let mut verts: Vec<VertexId> = self.faces[f]
                .vertices
                .iter()
                .map(|&v| if v == from { to } else { v })
                .collect();
            verts.dedup();
            while verts.len() > 1 && verts.first() == verts.last() {
                verts.pop();
            }

            let mut distinct = verts.clone();
            distinct.sort();
            distinct.dedup();
            if verts.len() < 3 || distinct.len() != verts.len() {
                self.remove_face(f)?;
                stats.faces_removed += 1;
            } else {
                remapped.push((f, verts));
            }
        }

        // Unlink the surviving faces from their old edges
        for (f, _) in &remapped {
            let old_edges = std::mem::take(&mut self.faces[*f].edges);
            for e in old_edges {
                if let Some(list) = self.edge_faces.get_mut(e) {
                    list.retain(|x| x != f);
                }
            }
        }

        // Edges: move every edge of `from` onto `to` unless it collapses or
        // duplicates an existing edge
        let incident = self.vertex_edges.get(from).cloned().unwrap_or_default();
        for e in incident {
            let edge = self.detach_edge(e);
            let Some(other) = edge.other(from) else {
                continue;
            };
            if other == to || self.find_edge(to, other).is_some() {
                continue;
            }
            let id = self.connect(to, other)?;
            if let Some(slot) = self.edge_user_data_mut(id) {
                *slot = edge.user_data;
            }
        }

        self.vertex_edges.remove(from);
        self.vertices.remove(from);

        // Relink surviving faces along their new loops
        for (f, verts) in remapped {
            let n = verts.len();
            let mut edges = Vec::with_capacity(n);
            for i in 0..n {
                edges.push(self.connect(verts[i], verts[(i + 1) % n])?);
            }
            for &e in &edges {
                if let Some(list) = self.edge_faces.get_mut(e) {
                    list.push(f);
                }
            }
            let face = &mut self.faces[f];
            face.vertices = verts;
            face.edges = edges;
            face.normal = None;
        }

        self.bump_revision();
        stats.edges_removed = edges_before.saturating_sub(self.edges.len());
        Ok(stats)
    }

    /// Store the geometric normal on every face
    pub fn recalculate_face_normals(&mut self) {
        let normals: Vec<(FaceId, Option<DVec3>)> =
            self.face_ids().map(|f| (f, self.face_normal(f))).collect();
        for (f, n) in normals {
            self.faces[f].normal = n;
        }
    }

    /// Store the average of the surrounding face normals on every vertex
    pub fn recalculate_vertex_normals(&mut self) {
        let mut sums: HashMap<VertexId, DVec3> = HashMap::new();
        for f in self.face_ids() {
            if let Some(n) = self.face_normal(f) {
                for &v in &self.faces[f].vertices {
                    *sums.entry(v).or_insert(DVec3::ZERO) += n;
                }
            }
        }
        for (id, vertex) in self.vertices.iter_mut() {
            vertex.normal = sums.get(&id).and_then(|n| n.try_normalize());
        }
    }

    /// Bake the object transform into positions and normals, then reset it
    /// to identity.
    pub fn apply_transform(&mut self) {
        let matrix = self.transform;
        let normal_matrix = if matrix.determinant().abs() > f64::EPSILON {
            Some(matrix.inverse().transpose())
        } else {
            None
        };

        let bake_normal = |n: DVec3| -> Option<DVec3> {
            normal_matrix.and_then(|m| m.transform_vector3(n).try_normalize())
        };

        for vertex in self.vertices.values_mut() {
            vertex.position = matrix.transform_point3(vertex.position);
            vertex.normal = vertex.normal.and_then(bake_normal);
        }
        for face in self.faces.values_mut() {
            face.normal = face.normal.and_then(bake_normal);
        }
        self.transform = glam::DMat4::IDENTITY;
    }
}
