//! Create, read and remove primitives for Mesh.
//!
//! Every add and remove keeps the adjacency indices in step with the slot
//! maps. Removals cascade: a face never outlives one of its edges or vertices.

use glam::DVec3;
use tracing::trace;

use super::Mesh;
use crate::types::{Edge, EdgeId, Face, FaceId, Result, TopologyError, Vertex, VertexId, edge_key};

/// Everything deleted by [`Mesh::remove_edge`]
#[derive(Debug, Clone)]
pub struct RemovedEdge {
    pub edge: Edge,
    /// Faces that used the edge and were removed with it
    pub faces: Vec<Face>,
}

/// Everything deleted by [`Mesh::remove_vertex`]
#[derive(Debug, Clone)]
pub struct RemovedVertex {
    pub vertex: Vertex,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
}

impl Mesh {
    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Mutable vertex access; positions, normals, UVs and user data are free
    /// to change because nothing structural references them.
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Mutable edge user data (endpoints are owned by the store)
    pub fn edge_user_data_mut(&mut self, id: EdgeId) -> Option<&mut Option<serde_json::Value>> {
        self.edges.get_mut(id).map(|e| &mut e.user_data)
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    /// Mutable face access; vertex and edge arrays are not reachable from outside
    /// the crate, so only material, normal and user data can change.
    pub fn face_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(id)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn contains_face(&self, id: FaceId) -> bool {
        self.faces.contains_key(id)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys()
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter()
    }

    pub fn position(&self, id: VertexId) -> Option<DVec3> {
        self.vertices.get(id).map(|v| v.position)
    }

    /// Set the position of a vertex
    pub fn set_vertex_position(&mut self, id: VertexId, position: DVec3) -> Result<()> {
        let v = self
            .vertices
            .get_mut(id)
            .ok_or(TopologyError::VertexNotFound(id))?;
        v.position = position;
        Ok(())
    }

    // ========================================================================
    // Add
    // ========================================================================

    /// Add a vertex; always succeeds
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = self.vertices.insert(vertex);
        self.vertex_edges.insert(id, Vec::new());
        self.bump_revision();
        id
    }

    /// Add an edge. Duplicate vertex pairs are allowed; use [`Mesh::connect`]
    /// to reuse an existing edge instead.
    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeId> {
        if !self.vertices.contains_key(edge.v1) {
            return Err(TopologyError::VertexNotFound(edge.v1));
        }
        if !self.vertices.contains_key(edge.v2) {
            return Err(TopologyError::VertexNotFound(edge.v2));
        }
        if edge.v1 == edge.v2 {
            return Err(TopologyError::DegenerateEdge(edge.v1));
        }

        let key = edge.key();
        let (v1, v2) = (edge.v1, edge.v2);
        let id = self.edges.insert(edge);
        self.edge_faces.insert(id, Vec::new());
        self.edge_lookup.entry(key).or_default().push(id);
        for v in [v1, v2] {
            if let Some(list) = self.vertex_edges.get_mut(v) {
                list.push(id);
            }
        }
        self.bump_revision();
        Ok(id)
    }

    /// Find the edge joining `a` and `b`, creating it if needed
    pub fn connect(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId> {
        if let Some(existing) = self.find_edge(a, b) {
            return Ok(existing);
        }
        self.add_edge(Edge::new(a, b))
    }

    /// Add a face.
    ///
    /// The face must reference at least 3 distinct live vertices. If it carries
    /// an edge array, each entry must join the matching corner pair; otherwise
    /// edges are found or created along the winding.
    pub fn add_face(&mut self, mut face: Face) -> Result<FaceId> {
        self.check_face_vertices(&face.vertices)?;

        if face.edges.is_empty() {
            let pairs: Vec<(VertexId, VertexId)> = face.corner_pairs().collect();
            let mut edges = Vec::with_capacity(pairs.len());
            for (a, b) in pairs {
                edges.push(self.connect(a, b)?);
            }
            face.edges = edges;
        } else {
            self.check_face_edges(&face)?;
        }

        let edges = face.edges.clone();
        let id = self.faces.insert(face);
        for e in edges {
            if let Some(list) = self.edge_faces.get_mut(e) {
                list.push(id);
            }
        }
        self.bump_revision();
        trace!("add_face: {:?} with {} corners", id, self.faces[id].vertices.len());
        Ok(id)
    }

    /// Replace the vertex loop of an existing face, keeping its handle,
    /// material and user data. Edges are re-derived along the new winding;
    /// edges that lose their last face are kept as wire edges.
    pub fn rewire_face(&mut self, id: FaceId, vertices: Vec<VertexId>) -> Result<()> {
        if !self.faces.contains_key(id) {
            return Err(TopologyError::FaceNotFound(id));
        }
        self.check_face_vertices(&vertices)?;

        let n = vertices.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(self.connect(vertices[i], vertices[(i + 1) % n])?);
        }

        let old_edges = std::mem::take(&mut self.faces[id].edges);
        for e in old_edges {
            if let Some(list) = self.edge_faces.get_mut(e) {
                list.retain(|&f| f != id);
            }
        }
        for &e in &edges {
            if let Some(list) = self.edge_faces.get_mut(e) {
                list.push(id);
            }
        }

        let face = &mut self.faces[id];
        face.vertices = vertices;
        face.edges = edges;
        face.normal = None;
        self.bump_revision();
        Ok(())
    }

    pub(crate) fn check_face_vertices(&self, vertices: &[VertexId]) -> Result<()> {
        for &v in vertices {
            if !self.vertices.contains_key(v) {
                return Err(TopologyError::VertexNotFound(v));
            }
        }
        let mut distinct = vertices.to_vec();
        distinct.sort();
        distinct.dedup();
        if vertices.len() < 3 || distinct.len() != vertices.len() {
            return Err(TopologyError::DegenerateFace {
                distinct: distinct.len(),
            });
        }
        Ok(())
    }

    fn check_face_edges(&self, face: &Face) -> Result<()> {
        if face.edges.len() != face.vertices.len() {
            return Err(TopologyError::FaceEdgeCount {
                vertices: face.vertices.len(),
                edges: face.edges.len(),
            });
        }
        for (position, ((a, b), &e)) in face.corner_pairs().zip(&face.edges).enumerate() {
            let edge = self.edges.get(e).ok_or(TopologyError::EdgeNotFound(e))?;
            if !edge.connects(a, b) {
                return Err(TopologyError::FaceEdgeMismatch { position });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Remove
    // ========================================================================

    /// Remove a face. Its edges and vertices stay.
    ///
    /// # Panics
    /// If the adjacency index does not list the face under one of its edges,
    /// which means the store was corrupted.
    pub fn remove_face(&mut self, id: FaceId) -> Result<Face> {
        let face = self.faces.remove(id).ok_or(TopologyError::FaceNotFound(id))?;
        for &e in &face.edges {
            let list = self
                .edge_faces
                .get_mut(e)
                .unwrap_or_else(|| panic!("remove_face: edge {e} of face {id} missing from adjacency"));
            let before = list.len();
            list.retain(|&f| f != id);
            assert!(
                list.len() < before,
                "remove_face: face {id} not registered on edge {e}"
            );
        }
        self.bump_revision();
        Ok(face)
    }

    /// Remove an edge together with every face that uses it.
    ///
    /// # Panics
    /// If the adjacency index is out of sync with the edge's endpoints.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<RemovedEdge> {
        if !self.edges.contains_key(id) {
            return Err(TopologyError::EdgeNotFound(id));
        }

        let face_ids = self.edge_faces.get(id).cloned().unwrap_or_default();
        let mut faces = Vec::with_capacity(face_ids.len());
        for f in face_ids {
            faces.push(self.remove_face(f)?);
        }

        let edge = self.detach_edge(id);
        trace!("remove_edge: {} (cascaded {} faces)", id, faces.len());
        Ok(RemovedEdge { edge, faces })
    }

    /// Remove a vertex together with every edge and face that uses it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<RemovedVertex> {
        if !self.vertices.contains_key(id) {
            return Err(TopologyError::VertexNotFound(id));
        }

        let mut edges = Vec::new();
        let mut faces = Vec::new();
        let incident = self.vertex_edges.get(id).cloned().unwrap_or_default();
        for e in incident {
            let removed = self.remove_edge(e)?;
            edges.push(removed.edge);
            faces.extend(removed.faces);
        }

        self.vertex_edges.remove(id);
        let vertex = self
            .vertices
            .remove(id)
            .ok_or(TopologyError::VertexNotFound(id))?;
        self.bump_revision();
        trace!(
            "remove_vertex: {} (cascaded {} edges, {} faces)",
            id,
            edges.len(),
            faces.len()
        );
        Ok(RemovedVertex {
            vertex,
            edges,
            faces,
        })
    }

    /// Unlink and delete an edge that no face references.
    pub(crate) fn detach_edge(&mut self, id: EdgeId) -> Edge {
        let edge = self
            .edges
            .remove(id)
            .unwrap_or_else(|| panic!("detach_edge: edge {id} does not exist"));
        if let Some(faces) = self.edge_faces.remove(id) {
            assert!(
                faces.is_empty(),
                "detach_edge: edge {id} is still used by {} faces",
                faces.len()
            );
        }

        let key = edge_key(edge.v1, edge.v2);
        if let Some(list) = self.edge_lookup.get_mut(&key) {
            list.retain(|&e| e != id);
            if list.is_empty() {
                self.edge_lookup.remove(&key);
            }
        }
        for v in [edge.v1, edge.v2] {
            let list = self
                .vertex_edges
                .get_mut(v)
                .unwrap_or_else(|| panic!("detach_edge: endpoint {v} of edge {id} missing"));
            list.retain(|&e| e != id);
        }
        self.bump_revision();
        edge
    }
}
