//! Handle-based polygon mesh store for editing operations
//!
//! Vertices, edges and faces live in generation-checked slot maps, so removing
//! an element only invalidates handles to that element. The store maintains
//! adjacency indices (vertex to edges, edge to faces, vertex pair to edges) on
//! every add and remove, which keeps the topology queries used by the editing
//! operators proportional to local degree instead of mesh size.

mod modification;
mod queries;
mod staging;
mod store;
mod validation;

use std::collections::HashMap;

use glam::DMat4;
use slotmap::{SecondaryMap, SlotMap};

use crate::types::{Edge, EdgeId, Face, FaceId, MeshId, MeshStats, Vertex, VertexId};

pub use modification::CollapseOutcome;
pub use queries::EdgeKind;
pub use staging::{EditSummary, MeshEdit, StagedFace, VertexRef};
pub use store::{RemovedEdge, RemovedVertex};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport, validate_mesh};

/// Polygon mesh: the sole owner of its vertices, edges and faces.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) id: MeshId,
    pub name: String,
    /// Object transform (column-major)
    pub transform: DMat4,
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    /// Edges incident to each vertex
    pub(crate) vertex_edges: SecondaryMap<VertexId, Vec<EdgeId>>,
    /// Faces using each edge
    pub(crate) edge_faces: SecondaryMap<EdgeId, Vec<FaceId>>,
    /// Map from unordered vertex pair to the edges joining them
    pub(crate) edge_lookup: HashMap<(VertexId, VertexId), Vec<EdgeId>>,
    /// Bumped on every structural change
    pub(crate) topology_revision: u64,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new("mesh")
    }
}

impl Mesh {
    /// Create an empty mesh with a fresh identity
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(MeshId::next(), name)
    }

    pub(crate) fn with_id(id: MeshId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            transform: DMat4::IDENTITY,
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            vertex_edges: SecondaryMap::new(),
            edge_faces: SecondaryMap::new(),
            edge_lookup: HashMap::new(),
            topology_revision: 0,
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Deep copy with a new identity token
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = MeshId::next();
        copy
    }

    /// Revision counter for structural changes (adds and removes)
    pub fn topology_revision(&self) -> u64 {
        self.topology_revision
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn stats(&self) -> MeshStats {
        MeshStats {
            vertices: self.vertices.len(),
            edges: self.edges.len(),
            faces: self.faces.len(),
        }
    }

    pub(crate) fn bump_revision(&mut self) {
        self.topology_revision = self.topology_revision.wrapping_add(1);
    }
}

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    //! Small hand-built meshes for tests.

    use glam::DVec3;

    use super::Mesh;
    use crate::types::{Face, Vertex, VertexId};

    fn add_points(mesh: &mut Mesh, points: &[[f64; 3]]) -> Vec<VertexId> {
        points
            .iter()
            .map(|p| mesh.add_vertex(Vertex::new(DVec3::from_array(*p))))
            .collect()
    }

    fn add_faces(mesh: &mut Mesh, ids: &[VertexId], faces: &[&[usize]]) {
        for face in faces {
            let verts: Vec<VertexId> = face.iter().map(|&i| ids[i]).collect();
            mesh.add_face(Face::new(verts))
                .expect("fixture faces are well formed");
        }
    }

    /// Unit cube: 8 vertices, 12 edges, 6 outward-wound quads
    pub fn cube() -> Mesh {
        let mut mesh = Mesh::new("cube");
        let ids = add_points(
            &mut mesh,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
        );
        add_faces(
            &mut mesh,
            &ids,
            &[
                &[0, 3, 2, 1],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
            ],
        );
        mesh
    }

    /// Flat `nx` by `ny` grid of quads in the XY plane
    pub fn quad_grid(nx: usize, ny: usize) -> Mesh {
        let mut mesh = Mesh::new("grid");
        let mut ids = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                ids.push(mesh.add_vertex(Vertex::new(DVec3::new(i as f64, j as f64, 0.0))));
            }
        }
        let row = nx + 1;
        for j in 0..ny {
            for i in 0..nx {
                let a = ids[j * row + i];
                let b = ids[j * row + i + 1];
                let c = ids[(j + 1) * row + i + 1];
                let d = ids[(j + 1) * row + i];
                mesh.add_face(Face::new(vec![a, b, c, d]))
                    .expect("grid faces are well formed");
            }
        }
        mesh
    }

    /// Open cylinder of `segments` quads around the Z axis, `rings` quads tall.
    ///
    /// Every vertical edge sits on a closed ring of quads.
    pub fn tube(segments: usize, rings: usize) -> Mesh {
        let mut mesh = Mesh::new("tube");
        let mut ids = Vec::with_capacity(segments * (rings + 1));
        for r in 0..=rings {
            for s in 0..segments {
                let angle = std::f64::consts::TAU * s as f64 / segments as f64;
                ids.push(mesh.add_vertex(Vertex::new(DVec3::new(
                    angle.cos(),
                    angle.sin(),
                    r as f64,
                ))));
            }
        }
        for r in 0..rings {
            for s in 0..segments {
                let next = (s + 1) % segments;
                let a = ids[r * segments + s];
                let b = ids[r * segments + next];
                let c = ids[(r + 1) * segments + next];
                let d = ids[(r + 1) * segments + s];
                mesh.add_face(Face::new(vec![a, b, c, d]))
                    .expect("tube faces are well formed");
            }
        }
        mesh
    }

    /// Regular tetrahedron-like closed triangle mesh
    pub fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new("tetrahedron");
        let ids = add_points(
            &mut mesh,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
        );
        add_faces(&mut mesh, &ids, &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]]);
        mesh
    }

    /// Two separate horizontal segments one unit apart, not sharing vertices
    pub fn parallel_edges() -> Mesh {
        let mut mesh = Mesh::new("parallel");
        let ids = add_points(
            &mut mesh,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
        );
        mesh.connect(ids[0], ids[1]).expect("fixture edge");
        mesh.connect(ids[2], ids[3]).expect("fixture edge");
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mesh_is_empty() {
        let mesh = Mesh::new("empty");
        assert!(mesh.is_empty());
        assert_eq!(mesh.stats(), MeshStats::default());
        assert_eq!(mesh.transform, DMat4::IDENTITY);
    }

    #[test]
    fn test_duplicate_gets_new_identity() {
        let mesh = fixtures::cube();
        let copy = mesh.duplicate();
        assert_ne!(mesh.id(), copy.id());
        assert_eq!(mesh.stats(), copy.stats());
    }

    #[test]
    fn test_cube_fixture_counts() {
        let mesh = fixtures::cube();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.face_count(), 6);
        assert!(validate_mesh(&mesh).is_valid);
    }

    #[test]
    fn test_tube_fixture_counts() {
        let mesh = fixtures::tube(8, 2);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.face_count(), 16);
        // 8 vertical edges per ring of quads, 8 horizontal per vertex ring
        assert_eq!(mesh.edge_count(), 16 + 24);
    }
}
