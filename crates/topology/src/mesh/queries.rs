//! Read-only adjacency and geometry queries.
//!
//! All adjacency lookups go through the maintained indices, so they cost
//! O(degree) rather than a scan of the mesh.

use glam::DVec3;

use super::Mesh;
use crate::geometry::{self, Aabb};
use crate::types::{EdgeId, FaceId, VertexId, edge_key};

/// How many faces use an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// No faces (wire edge)
    Isolated,
    /// Exactly one face
    Boundary,
    /// Exactly two faces
    Manifold,
    /// Three or more faces
    NonManifold,
}

impl EdgeKind {
    fn from_face_count(count: usize) -> Self {
        match count {
            0 => Self::Isolated,
            1 => Self::Boundary,
            2 => Self::Manifold,
            _ => Self::NonManifold,
        }
    }
}

impl Mesh {
    /// Edges incident to a vertex (empty for unknown handles)
    pub fn edges_of_vertex(&self, v: VertexId) -> &[EdgeId] {
        self.vertex_edges.get(v).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Faces that use an edge, in insertion order
    pub fn faces_of_edge(&self, e: EdgeId) -> &[FaceId] {
        self.edge_faces.get(e).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Faces with `v` as a corner, without duplicates
    pub fn faces_of_vertex(&self, v: VertexId) -> Vec<FaceId> {
        let mut faces = Vec::new();
        for &e in self.edges_of_vertex(v) {
            for &f in self.faces_of_edge(e) {
                if !faces.contains(&f) && self.faces[f].contains_vertex(v) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    /// Vertices sharing an edge with `v`, without duplicates
    pub fn vertices_adjacent_to(&self, v: VertexId) -> Vec<VertexId> {
        let mut neighbors = Vec::new();
        for &e in self.edges_of_vertex(v) {
            if let Some(other) = self.edges[e].other(v) {
                if !neighbors.contains(&other) {
                    neighbors.push(other);
                }
            }
        }
        neighbors
    }

    /// First edge joining `a` and `b`, in either direction
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_lookup
            .get(&edge_key(a, b))
            .and_then(|list| list.first().copied())
    }

    /// Every edge joining `a` and `b` (more than one only for duplicate edges)
    pub fn edges_between(&self, a: VertexId, b: VertexId) -> &[EdgeId] {
        self.edge_lookup
            .get(&edge_key(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_kind(&self, e: EdgeId) -> EdgeKind {
        EdgeKind::from_face_count(self.faces_of_edge(e).len())
    }

    /// An edge is on the boundary if exactly one face uses it
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        self.edge_kind(e) == EdgeKind::Boundary
    }

    /// A vertex is on the boundary if it touches at least one boundary edge
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.edges_of_vertex(v)
            .iter()
            .any(|&e| self.is_boundary_edge(e))
    }

    pub fn edge_endpoints(&self, e: EdgeId) -> Option<(VertexId, VertexId)> {
        self.edges.get(e).map(|edge| (edge.v1, edge.v2))
    }

    /// Endpoint positions of an edge
    pub fn edge_positions(&self, e: EdgeId) -> Option<(DVec3, DVec3)> {
        let edge = self.edges.get(e)?;
        Some((self.position(edge.v1)?, self.position(edge.v2)?))
    }

    pub fn edge_length(&self, e: EdgeId) -> Option<f64> {
        self.edge_positions(e).map(|(a, b)| a.distance(b))
    }

    pub fn edge_midpoint(&self, e: EdgeId) -> Option<DVec3> {
        self.edge_positions(e).map(|(a, b)| (a + b) * 0.5)
    }

    /// Corner positions of a face in winding order
    pub fn face_positions(&self, f: FaceId) -> Option<Vec<DVec3>> {
        let face = self.faces.get(f)?;
        face.vertices.iter().map(|&v| self.position(v)).collect()
    }

    /// Geometric face normal (ignores the cached value)
    pub fn face_normal(&self, f: FaceId) -> Option<DVec3> {
        geometry::polygon_normal(&self.face_positions(f)?)
    }

    pub fn face_centroid(&self, f: FaceId) -> Option<DVec3> {
        geometry::centroid(&self.face_positions(f)?)
    }

    /// Stored vertex normal, or the average of the surrounding face normals
    pub fn vertex_normal(&self, v: VertexId) -> Option<DVec3> {
        let vertex = self.vertices.get(v)?;
        if let Some(n) = vertex.normal {
            return Some(n);
        }
        let sum: DVec3 = self
            .faces_of_vertex(v)
            .into_iter()
            .filter_map(|f| self.face_normal(f))
            .sum();
        sum.try_normalize()
    }

    /// Position of `e` in the face's edge cycle
    pub fn edge_index_in_face(&self, f: FaceId, e: EdgeId) -> Option<usize> {
        self.faces.get(f)?.edges.iter().position(|&x| x == e)
    }

    /// The edge two steps around a quad from `e`; `None` for non-quads
    pub fn opposite_edge_in_quad(&self, f: FaceId, e: EdgeId) -> Option<EdgeId> {
        let face = self.faces.get(f)?;
        if face.edges.len() != 4 {
            return None;
        }
        let i = face.edges.iter().position(|&x| x == e)?;
        Some(face.edges[(i + 2) % 4])
    }

    /// Bounding box of all vertex positions (empty box for an empty mesh)
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.values().map(|v| &v.position))
    }
}
