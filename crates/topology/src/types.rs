//! Type definitions for the mesh store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{DVec2, DVec3};
use serde_json::Value;
use slotmap::{Key, new_key_type};

new_key_type! {
    /// Stable handle to a vertex
    pub struct VertexId;
    /// Stable handle to an edge
    pub struct EdgeId;
    /// Stable handle to a face
    pub struct FaceId;
}

macro_rules! impl_handle_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{:?}", self.data())
                }
            }
        )*
    };
}

impl_handle_display!(VertexId, EdgeId, FaceId);

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity token of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u64);

impl MeshId {
    /// Allocate a process-unique mesh id
    pub fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh-{}", self.0)
    }
}

/// A vertex in the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    /// Unit normal, if the producer supplied one
    pub normal: Option<DVec3>,
    /// Texture coordinate (nominally in [0, 1], never clamped)
    pub uv: Option<DVec2>,
    pub user_data: Option<Value>,
}

impl Vertex {
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            normal: None,
            uv: None,
            user_data: None,
        }
    }

    pub fn with_normal(mut self, normal: DVec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_uv(mut self, uv: DVec2) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_user_data(mut self, user_data: Value) -> Self {
        self.user_data = Some(user_data);
        self
    }
}

impl From<DVec3> for Vertex {
    fn from(position: DVec3) -> Self {
        Self::new(position)
    }
}

/// An undirected edge between two vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub v1: VertexId,
    pub v2: VertexId,
    pub user_data: Option<Value>,
}

impl Edge {
    pub fn new(v1: VertexId, v2: VertexId) -> Self {
        Self {
            v1,
            v2,
            user_data: None,
        }
    }

    pub fn with_user_data(mut self, user_data: Value) -> Self {
        self.user_data = Some(user_data);
        self
    }

    /// Whether `v` is one of the endpoints
    pub fn contains(&self, v: VertexId) -> bool {
        self.v1 == v || self.v2 == v
    }

    /// The endpoint opposite `v`, if `v` is an endpoint
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if self.v1 == v {
            Some(self.v2)
        } else if self.v2 == v {
            Some(self.v1)
        } else {
            None
        }
    }

    /// Whether this edge joins `a` and `b` in either direction
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.v1 == a && self.v2 == b) || (self.v1 == b && self.v2 == a)
    }

    /// Order-independent key for the vertex pair
    pub fn key(&self) -> (VertexId, VertexId) {
        edge_key(self.v1, self.v2)
    }

    /// Whether the two edges share an endpoint
    pub fn shares_vertex(&self, other: &Edge) -> bool {
        self.contains(other.v1) || self.contains(other.v2)
    }
}

/// Order-independent key for an unordered vertex pair
pub fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A polygon face.
///
/// The vertex and edge arrays are only writable through the store, which keeps
/// `edges[i]` joining `vertices[i]` and `vertices[(i + 1) % n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub(crate) vertices: Vec<VertexId>,
    pub(crate) edges: Vec<EdgeId>,
    pub material_index: u32,
    /// Cached normal (recomputed by `recalculate_face_normals`)
    pub normal: Option<DVec3>,
    pub user_data: Option<Value>,
}

impl Face {
    /// Describe a new face by its vertex loop; edges are derived on insert
    pub fn new(vertices: impl Into<Vec<VertexId>>) -> Self {
        Self {
            vertices: vertices.into(),
            edges: Vec::new(),
            material_index: 0,
            normal: None,
            user_data: None,
        }
    }

    pub fn with_material(mut self, material_index: u32) -> Self {
        self.material_index = material_index;
        self
    }

    /// Supply explicit edges; the store checks them against the winding
    pub fn with_edges(mut self, edges: impl Into<Vec<EdgeId>>) -> Self {
        self.edges = edges.into();
        self
    }

    pub fn with_normal(mut self, normal: DVec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_user_data(mut self, user_data: Value) -> Self {
        self.user_data = Some(user_data);
        self
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Number of corners
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.contains(&e)
    }

    /// Iterate over directed corner pairs `(vertices[i], vertices[i + 1])`
    pub fn corner_pairs(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// Element counts, used for before/after reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MeshStats {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
}

/// Errors that can occur during mesh store operations
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Vertex {0} not found")]
    VertexNotFound(VertexId),
    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),
    #[error("Face {0} not found")]
    FaceNotFound(FaceId),
    #[error("Edge endpoints must differ (vertex {0})")]
    DegenerateEdge(VertexId),
    #[error("Face needs at least 3 distinct vertices, got {distinct}")]
    DegenerateFace { distinct: usize },
    #[error("Face edge {position} does not join its corner vertices")]
    FaceEdgeMismatch { position: usize },
    #[error("Face has {edges} edges for {vertices} vertices")]
    FaceEdgeCount { vertices: usize, edges: usize },
    #[error("Staged vertex reference {0} is out of range")]
    InvalidStagedVertex(usize),
    #[error("Edge {edge} is still used by face {face}")]
    EdgeStillReferenced { edge: EdgeId, face: FaceId },
    #[error("Index {index} out of range for {kind} ({len} elements)")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    #[error("Snapshot is stale: taken at revision {snapshot}, mesh is at {mesh}")]
    StaleSnapshot { snapshot: u64, mesh: u64 },
    #[error("Snapshot buffer has {actual} bytes, expected {expected}")]
    SnapshotSize { expected: usize, actual: usize },
    #[error("Invalid mesh JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using [`TopologyError`].
pub type Result<T> = std::result::Result<T, TopologyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_edge_other_and_key() {
        let mut sm: SlotMap<VertexId, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        let c = sm.insert(());

        let edge = Edge::new(b, a);
        assert_eq!(edge.other(a), Some(b));
        assert_eq!(edge.other(b), Some(a));
        assert_eq!(edge.other(c), None);
        assert_eq!(edge.key(), Edge::new(a, b).key());
        assert!(edge.connects(a, b));
        assert!(!edge.connects(a, c));
    }

    #[test]
    fn test_face_corner_pairs_wrap() {
        let mut sm: SlotMap<VertexId, ()> = SlotMap::with_key();
        let ids: Vec<VertexId> = (0..3).map(|_| sm.insert(())).collect();
        let face = Face::new(ids.clone());
        let pairs: Vec<_> = face.corner_pairs().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], (ids[2], ids[0]));
    }

    #[test]
    fn test_mesh_ids_are_unique() {
        let a = MeshId::next();
        let b = MeshId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_messages_name_the_handle() {
        let mut sm: SlotMap<EdgeId, ()> = SlotMap::with_key();
        let e = sm.insert(());
        let message = TopologyError::EdgeNotFound(e).to_string();
        assert_eq!(message, format!("Edge {} not found", e));
        assert!(message.ends_with("not found"));
    }
}
