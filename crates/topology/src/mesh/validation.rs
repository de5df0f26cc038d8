//! Consistency checks for Mesh.
//!
//! The store keeps these invariants on its own; the validator exists so that
//! operators and callers can confirm it after an edit, and so that meshes
//! loaded from outside can be screened before cutting into them.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use super::Mesh;
use crate::types::{EdgeId, FaceId, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A single problem found by [`validate_mesh`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    DanglingEdgeVertex { edge: EdgeId, vertex: VertexId },
    DanglingFaceVertex { face: FaceId, vertex: VertexId },
    DanglingFaceEdge { face: FaceId, edge: EdgeId },
    FaceEdgeMismatch { face: FaceId, position: usize },
    EdgeArrayLength { face: FaceId, vertices: usize, edges: usize },
    DegenerateFace { face: FaceId, distinct: usize },
    DegenerateEdge { edge: EdgeId },
    DuplicateEdge { edge: EdgeId, duplicate_of: EdgeId },
    NonManifoldEdge { edge: EdgeId, faces: usize },
    IsolatedVertex { vertex: VertexId },
    AdjacencyOutOfSync { detail: String },
}

impl ValidationIssue {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::DuplicateEdge { .. } | Self::NonManifoldEdge { .. } | Self::IsolatedVertex { .. } => {
                IssueSeverity::Warning
            }
            _ => IssueSeverity::Error,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEdgeVertex { edge, vertex } => {
                write!(f, "Edge {} references missing vertex {}", edge, vertex)
            }
            Self::DanglingFaceVertex { face, vertex } => {
                write!(f, "Face {} references missing vertex {}", face, vertex)
            }
            Self::DanglingFaceEdge { face, edge } => {
                write!(f, "Face {} references missing edge {}", face, edge)
            }
            Self::FaceEdgeMismatch { face, position } => {
                write!(f, "Face {} edge {} does not join its corners", face, position)
            }
            Self::EdgeArrayLength {
                face,
                vertices,
                edges,
            } => write!(
                f,
                "Face {} has {} edges for {} vertices",
                face, edges, vertices
            ),
            Self::DegenerateFace { face, distinct } => write!(
                f,
                "Face {} has only {} distinct vertices",
                face, distinct
            ),
            Self::DegenerateEdge { edge } => write!(f, "Edge {} joins a vertex to itself", edge),
            Self::DuplicateEdge { edge, duplicate_of } => {
                write!(f, "Edge {} duplicates edge {}", edge, duplicate_of)
            }
            Self::NonManifoldEdge { edge, faces } => {
                write!(f, "Edge {} is shared by {} faces", edge, faces)
            }
            Self::IsolatedVertex { vertex } => write!(f, "Vertex {} has no edges", vertex),
            Self::AdjacencyOutOfSync { detail } => write!(f, "Adjacency out of sync: {}", detail),
        }
    }
}

/// Result of [`validate_mesh`]. `is_valid` is false if any issue is an error;
/// warnings alone keep the mesh valid.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == IssueSeverity::Warning)
    }
}

/// Check every reference and adjacency index of the mesh
pub fn validate_mesh(mesh: &Mesh) -> ValidationReport {
    let mut issues = Vec::new();

    // Edges
    for (id, edge) in mesh.edges.iter() {
        for v in [edge.v1, edge.v2] {
            if !mesh.vertices.contains_key(v) {
                issues.push(ValidationIssue::DanglingEdgeVertex { edge: id, vertex: v });
            }
        }
        if edge.v1 == edge.v2 {
            issues.push(ValidationIssue::DegenerateEdge { edge: id });
        }
        if let Some(first) = mesh.find_edge(edge.v1, edge.v2) {
            if first != id {
                issues.push(ValidationIssue::DuplicateEdge {
                    edge: id,
                    duplicate_of: first,
                });
            }
        }
        let face_count = mesh.faces_of_edge(id).len();
        if face_count > 2 {
            issues.push(ValidationIssue::NonManifoldEdge {
                edge: id,
                faces: face_count,
            });
        }
        for v in [edge.v1, edge.v2] {
            if !mesh.edges_of_vertex(v).contains(&id) {
                issues.push(ValidationIssue::AdjacencyOutOfSync {
                    detail: format!("edge {} not listed under vertex {}", id, v),
                });
            }
        }
    }

    // Faces
    for (id, face) in mesh.faces.iter() {
        for &v in &face.vertices {
            if !mesh.vertices.contains_key(v) {
                issues.push(ValidationIssue::DanglingFaceVertex { face: id, vertex: v });
            }
        }
        let distinct: HashSet<VertexId> = face.vertices.iter().copied().collect();
        if face.vertices.len() < 3 || distinct.len() != face.vertices.len() {
            issues.push(ValidationIssue::DegenerateFace {
                face: id,
                distinct: distinct.len(),
            });
        }
        if face.edges.len() != face.vertices.len() {
            issues.push(ValidationIssue::EdgeArrayLength {
                face: id,
                vertices: face.vertices.len(),
                edges: face.edges.len(),
            });
            continue;
        }
        for (position, ((a, b), &e)) in face.corner_pairs().zip(&face.edges).enumerate() {
            match mesh.edges.get(e) {
                None => issues.push(ValidationIssue::DanglingFaceEdge { face: id, edge: e }),
                Some(edge) if !edge.connects(a, b) => {
                    issues.push(ValidationIssue::FaceEdgeMismatch { face: id, position })
                }
                Some(_) => {
                    if !mesh.faces_of_edge(e).contains(&id) {
                        issues.push(ValidationIssue::AdjacencyOutOfSync {
                            detail: format!("face {} not listed under edge {}", id, e),
                        });
                    }
                }
            }
        }
    }

    // Vertices and reverse adjacency
    for (id, _) in mesh.vertices.iter() {
        let edges = mesh.edges_of_vertex(id);
        if edges.is_empty() {
            issues.push(ValidationIssue::IsolatedVertex { vertex: id });
        }
        for &e in edges {
            if !mesh.edges.get(e).is_some_and(|edge| edge.contains(id)) {
                issues.push(ValidationIssue::AdjacencyOutOfSync {
                    detail: format!("vertex {} lists foreign edge {}", id, e),
                });
            }
        }
    }
    for (e, faces) in mesh.edge_faces.iter() {
        for &f in faces {
            if !mesh.faces.get(f).is_some_and(|face| face.edges.contains(&e)) {
                issues.push(ValidationIssue::AdjacencyOutOfSync {
                    detail: format!("edge {} lists foreign face {}", e, f),
                });
            }
        }
    }

    let is_valid = !issues.iter().any(|i| i.severity() == IssueSeverity::Error);
    if !is_valid {
        warn!(
            "validate_mesh: {} is invalid ({} issues, first: {})",
            mesh.name,
            issues.len(),
            issues[0]
        );
    }
    ValidationReport { is_valid, issues }
}

impl Mesh {
    /// Shorthand for [`validate_mesh`]
    pub fn validate(&self) -> ValidationReport {
        validate_mesh(self)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use crate::types::{Edge, Face, Vertex};
    use glam::DVec3;

    #[test]
    fn test_fixtures_are_valid() {
        for mesh in [
            fixtures::cube(),
            fixtures::quad_grid(3, 2),
            fixtures::tube(6, 3),
            fixtures::tetrahedron(),
        ] {
            let report = validate_mesh(&mesh);
            assert!(report.is_valid, "{} should be valid: {:?}", mesh.name, report.issues);
            assert_eq!(report.warnings().count(), 0);
        }
    }

    #[test]
    fn test_isolated_vertex_is_a_warning() {
        let mut mesh = fixtures::cube();
        mesh.add_vertex(Vertex::new(DVec3::splat(9.0)));
        let report = validate_mesh(&mesh);
        assert!(report.is_valid);
        assert!(matches!(
            report.issues.as_slice(),
            [ValidationIssue::IsolatedVertex { .. }]
        ));
    }

    #[test]
    fn test_duplicate_edge_is_reported() {
        let mut mesh = fixtures::parallel_edges();
        let (a, b) = mesh.edge_ids().next().and_then(|e| mesh.edge_endpoints(e)).unwrap();
        mesh.add_edge(Edge::new(a, b)).unwrap();
        let report = validate_mesh(&mesh);
        assert!(report.is_valid);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_corrupted_face_is_an_error() {
        let mut mesh = fixtures::cube();
        let f = mesh.face_ids().next().unwrap();
        // Break the face behind the store's back
        mesh.faces[f].edges.pop();
        let report = validate_mesh(&mesh);
        assert!(!report.is_valid);
        assert!(report
            .errors()
            .any(|i| matches!(i, ValidationIssue::EdgeArrayLength { .. })));
    }

    #[test]
    fn test_non_manifold_fin() {
        let mut mesh = fixtures::quad_grid(1, 1);
        let (a, b) = {
            let f = mesh.face_ids().next().unwrap();
            let v = mesh.face(f).unwrap().vertices().to_vec();
            (v[0], v[1])
        };
        for z in [1.0, -1.0] {
            let apex = mesh.add_vertex(Vertex::new(DVec3::new(0.5, 0.0, z)));
            mesh.add_face(Face::new(vec![a, b, apex])).unwrap();
        }
        let report = validate_mesh(&mesh);
        assert!(report.is_valid);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::NonManifoldEdge { faces: 3, .. })));
    }

    #[test]
    fn test_issue_messages() {
        let mesh = fixtures::cube();
        let f = mesh.face_ids().next().unwrap();
        let issue = ValidationIssue::DegenerateFace { face: f, distinct: 2 };
        assert_eq!(issue.to_string(), format!("Face {} has only 2 distinct vertices", f));
    }
}
