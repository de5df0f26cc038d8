//! Staged mesh edits.
//!
//! Operators describe their whole change in a [`MeshEdit`], which is checked
//! against the mesh before anything is applied. A failed check leaves the mesh
//! untouched.

use std::collections::HashSet;

use glam::DVec3;
use serde_json::Value;
use tracing::{debug, trace};

use super::Mesh;
use crate::types::{Edge, EdgeId, Face, FaceId, Result, TopologyError, Vertex, VertexId};

/// A vertex that either exists already or is added by the same edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexRef {
    Existing(VertexId),
    /// Index into the edit's new vertices
    Staged(usize),
}

impl From<VertexId> for VertexRef {
    fn from(id: VertexId) -> Self {
        Self::Existing(id)
    }
}

/// A face to be added by a [`MeshEdit`]
#[derive(Debug, Clone)]
pub struct StagedFace {
    pub vertices: Vec<VertexRef>,
    pub material_index: u32,
    pub normal: Option<DVec3>,
    pub user_data: Option<Value>,
}

impl StagedFace {
    pub fn new(vertices: impl IntoIterator<Item = VertexRef>) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
            material_index: 0,
            normal: None,
            user_data: None,
        }
    }

    pub fn with_material(mut self, material_index: u32) -> Self {
        self.material_index = material_index;
        self
    }

    pub fn with_user_data(mut self, user_data: Option<Value>) -> Self {
        self.user_data = user_data;
        self
    }
}

#[derive(Debug, Clone)]
struct StagedEdge {
    a: VertexRef,
    b: VertexRef,
    user_data: Option<Value>,
}

/// What a committed edit created and removed
#[derive(Debug, Clone, Default)]
pub struct EditSummary {
    /// New vertices, in staging order
    pub vertices: Vec<VertexId>,
    /// Edges for staged edges, in staging order (may be pre-existing edges)
    pub edges: Vec<EdgeId>,
    /// New faces, in staging order
    pub faces: Vec<FaceId>,
    /// Net number of edges that did not exist before
    pub edges_created: usize,
    pub edges_removed: usize,
    pub faces_removed: usize,
}

/// A batch of mesh changes applied all-or-nothing.
///
/// Commit order: vertex moves, face removals, vertex adds, face rewires, edge
/// removals, edge adds, face adds.
#[derive(Debug, Clone, Default)]
pub struct MeshEdit {
    vertices: Vec<Vertex>,
    edges: Vec<StagedEdge>,
    faces: Vec<StagedFace>,
    rewires: Vec<(FaceId, Vec<VertexRef>)>,
    moves: Vec<(VertexId, DVec3)>,
    removed_faces: Vec<FaceId>,
    removed_edges: Vec<EdgeId>,
}

impl MeshEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.edges.is_empty()
            && self.faces.is_empty()
            && self.rewires.is_empty()
            && self.moves.is_empty()
            && self.removed_faces.is_empty()
            && self.removed_edges.is_empty()
    }

    pub fn add_vertex(&mut self, vertex: impl Into<Vertex>) -> VertexRef {
        self.vertices.push(vertex.into());
        VertexRef::Staged(self.vertices.len() - 1)
    }

    /// Position of a staged or existing vertex as it will be after commit
    pub fn position(&self, mesh: &Mesh, v: VertexRef) -> Option<DVec3> {
        match v {
            VertexRef::Staged(i) => self.vertices.get(i).map(|vx| vx.position),
            VertexRef::Existing(id) => self
                .moves
                .iter()
                .rev()
                .find(|(m, _)| *m == id)
                .map(|(_, p)| *p)
                .or_else(|| mesh.position(id)),
        }
    }

    /// Stage an edge; existing edges with the same endpoints are reused
    pub fn add_edge(&mut self, a: impl Into<VertexRef>, b: impl Into<VertexRef>) -> usize {
        self.edges.push(StagedEdge {
            a: a.into(),
            b: b.into(),
            user_data: None,
        });
        self.edges.len() - 1
    }

    pub fn add_edge_with_user_data(
        &mut self,
        a: impl Into<VertexRef>,
        b: impl Into<VertexRef>,
        user_data: Option<Value>,
    ) -> usize {
        let index = self.add_edge(a, b);
        self.edges[index].user_data = user_data;
        index
    }

    /// Stage a face; its edges are found or created on commit
    pub fn add_face(&mut self, face: StagedFace) -> usize {
        self.faces.push(face);
        self.faces.len() - 1
    }

    /// Replace the vertex loop of an existing face, keeping its handle
    pub fn rewire_face(&mut self, face: FaceId, vertices: impl IntoIterator<Item = VertexRef>) {
        self.rewires.push((face, vertices.into_iter().collect()));
    }

    pub fn remove_face(&mut self, face: FaceId) {
        if !self.removed_faces.contains(&face) {
            self.removed_faces.push(face);
        }
    }

    /// Remove an edge; every face using it must be removed or rewired away
    /// from it by the same edit.
    pub fn remove_edge(&mut self, edge: EdgeId) {
        if !self.removed_edges.contains(&edge) {
            self.removed_edges.push(edge);
        }
    }

    pub fn move_vertex(&mut self, vertex: VertexId, position: DVec3) {
        self.moves.push((vertex, position));
    }

    pub fn staged_vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn staged_face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check every reference without touching the mesh
    pub fn validate(&self, mesh: &Mesh) -> Result<()> {
        for &(v, _) in &self.moves {
            if !mesh.contains_vertex(v) {
                return Err(TopologyError::VertexNotFound(v));
            }
        }
        for &f in &self.removed_faces {
            if !mesh.contains_face(f) {
                return Err(TopologyError::FaceNotFound(f));
            }
        }

        for (f, loop_refs) in &self.rewires {
            if !mesh.contains_face(*f) || self.removed_faces.contains(f) {
                return Err(TopologyError::FaceNotFound(*f));
            }
            self.check_loop(mesh, loop_refs)?;
        }

        for &e in &self.removed_edges {
            let edge = mesh.edge(e).ok_or(TopologyError::EdgeNotFound(e))?;
            for &f in mesh.faces_of_edge(e) {
                if self.removed_faces.contains(&f) {
                    continue;
                }
                match self.rewires.iter().rev().find(|(rf, _)| *rf == f) {
                    Some((_, loop_refs)) if !loop_uses_pair(loop_refs, edge) => {}
                    _ => return Err(TopologyError::EdgeStillReferenced { edge: e, face: f }),
                }
            }
        }

        for edge in &self.edges {
            self.check_ref(mesh, edge.a)?;
            self.check_ref(mesh, edge.b)?;
            if edge.a == edge.b {
                return Err(match edge.a {
                    VertexRef::Existing(v) => TopologyError::DegenerateEdge(v),
                    VertexRef::Staged(i) => TopologyError::InvalidStagedVertex(i),
                });
            }
        }

        for face in &self.faces {
            self.check_loop(mesh, &face.vertices)?;
        }
        Ok(())
    }

    fn check_ref(&self, mesh: &Mesh, v: VertexRef) -> Result<()> {
        match v {
            VertexRef::Existing(id) if !mesh.contains_vertex(id) => {
                Err(TopologyError::VertexNotFound(id))
            }
            VertexRef::Staged(i) if i >= self.vertices.len() => {
                Err(TopologyError::InvalidStagedVertex(i))
            }
            _ => Ok(()),
        }
    }

    fn check_loop(&self, mesh: &Mesh, refs: &[VertexRef]) -> Result<()> {
        for &v in refs {
            self.check_ref(mesh, v)?;
        }
        let distinct: HashSet<VertexRef> = refs.iter().copied().collect();
        if refs.len() < 3 || distinct.len() != refs.len() {
            return Err(TopologyError::DegenerateFace {
                distinct: distinct.len(),
            });
        }
        Ok(())
    }

    /// Validate the whole edit, then apply it
    pub fn commit(self, mesh: &mut Mesh) -> Result<EditSummary> {
        trace!(
            "MeshEdit::commit: START {} verts, {} edges, {} faces, {} rewires",
            self.vertices.len(),
            self.edges.len(),
            self.faces.len(),
            self.rewires.len()
        );

        // ====================================================================
        // PHASE 1: VALIDATE (read-only, fail early)
        // ====================================================================
        self.validate(mesh)?;

        // ====================================================================
        // PHASE 2: APPLY
        // ====================================================================
        let edges_before = mesh.edge_count();

        for (v, position) in self.moves {
            mesh.set_vertex_position(v, position)?;
        }
        for &f in &self.removed_faces {
            mesh.remove_face(f)?;
        }

        let new_vertices: Vec<VertexId> = self
            .vertices
            .into_iter()
            .map(|v| mesh.add_vertex(v))
            .collect();
        let resolve = |r: VertexRef| -> VertexId {
            match r {
                VertexRef::Existing(id) => id,
                VertexRef::Staged(i) => new_vertices[i],
            }
        };

        for (f, refs) in self.rewires {
            mesh.rewire_face(f, refs.into_iter().map(resolve).collect())?;
        }

        let mut edges_removed = 0;
        for &e in &self.removed_edges {
            mesh.remove_edge(e)?;
            edges_removed += 1;
        }

        let mut summary_edges = Vec::with_capacity(self.edges.len());
        for edge in self.edges {
            let id = mesh.connect(resolve(edge.a), resolve(edge.b))?;
            if edge.user_data.is_some() {
                if let Some(slot) = mesh.edge_user_data_mut(id) {
                    *slot = edge.user_data;
                }
            }
            summary_edges.push(id);
        }

        let mut new_faces = Vec::with_capacity(self.faces.len());
        for staged in self.faces {
            let mut face = Face::new(staged.vertices.into_iter().map(resolve).collect::<Vec<_>>())
                .with_material(staged.material_index);
            face.normal = staged.normal;
            face.user_data = staged.user_data;
            new_faces.push(mesh.add_face(face)?);
        }

        let edges_created = (mesh.edge_count() + edges_removed).saturating_sub(edges_before);
        debug!(
            "MeshEdit::commit: +{} verts, +{} edges, +{} faces, -{} faces, -{} edges",
            new_vertices.len(),
            edges_created,
            new_faces.len(),
            self.removed_faces.len(),
            edges_removed
        );

        Ok(EditSummary {
            vertices: new_vertices,
            edges: summary_edges,
            faces: new_faces,
            edges_created,
            edges_removed,
            faces_removed: self.removed_faces.len(),
        })
    }
}

/// Whether a vertex loop has the edge's endpoints as consecutive corners
fn loop_uses_pair(refs: &[VertexRef], edge: &Edge) -> bool {
    let n = refs.len();
    (0..n).any(|i| match (refs[i], refs[(i + 1) % n]) {
        (VertexRef::Existing(a), VertexRef::Existing(b)) => edge.connects(a, b),
        _ => false,
    })
}
