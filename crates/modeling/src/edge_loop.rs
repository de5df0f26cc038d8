//! Quad-ring traversal.
//!
//! From a seed edge, step across a quad to the edge two positions further in
//! the quad's edge cycle, then into the quad on the far side of that edge, and
//! so on. The walk closes when it comes back to the seed and stops at boundary
//! edges, non-manifold edges and non-quad faces.

use polyforge_config::MAX_LOOP_WALK;
use topology::{EdgeId, FaceId, Mesh, VertexId};
use tracing::{trace, warn};

/// A ring edge with its endpoints ordered so that `from` of consecutive ring
/// edges lie on the same side of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    pub edge: EdgeId,
    pub from: VertexId,
    pub to: VertexId,
}

/// The parallel edges crossed by a quad ring.
///
/// `faces[i]` lies between `edges[i]` and `edges[i + 1]`; for a closed loop the
/// last face lies between the last edge and the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLoop {
    pub edges: Vec<OrientedEdge>,
    pub faces: Vec<FaceId>,
    pub closed: bool,
}

impl EdgeLoop {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.iter().any(|o| o.edge == e)
    }

    /// Face between ring edges `i` and `i + 1`
    pub fn face_after(&self, i: usize) -> Option<FaceId> {
        self.faces.get(i).copied()
    }
}

/// Find the quad ring through `seed`, or `None` if no quad borders it
pub fn find_edge_loop(mesh: &Mesh, seed: EdgeId) -> Option<EdgeLoop> {
    let (from, to) = mesh.edge_endpoints(seed)?;
    let quads: Vec<FaceId> = mesh
        .faces_of_edge(seed)
        .iter()
        .copied()
        .take(2)
        .filter(|&f| is_quad(mesh, f))
        .collect();
    if quads.is_empty() {
        trace!("find_edge_loop: seed {} has no quad faces", seed);
        return None;
    }

    let start = OrientedEdge {
        edge: seed,
        from,
        to,
    };
    let forward = walk(mesh, start, quads[0]);
    if forward.closed {
        let mut edges = vec![start];
        edges.extend(forward.edges);
        return Some(EdgeLoop {
            edges,
            faces: forward.faces,
            closed: true,
        });
    }

    // Open: extend the other way from the seed and splice
    let mut edges = Vec::new();
    let mut faces = Vec::new();
    if let Some(&other) = quads.get(1) {
        let backward = walk(mesh, start, other);
        edges.extend(backward.edges.into_iter().rev());
        faces.extend(backward.faces.into_iter().rev());
    }
    edges.push(start);
    edges.extend(forward.edges);
    faces.extend(forward.faces);

    Some(EdgeLoop {
        edges,
        faces,
        closed: false,
    })
}

struct Walk {
    edges: Vec<OrientedEdge>,
    faces: Vec<FaceId>,
    closed: bool,
}

fn is_quad(mesh: &Mesh, f: FaceId) -> bool {
    mesh.face(f).is_some_and(|face| face.len() == 4)
}

fn walk(mesh: &Mesh, start: OrientedEdge, first_face: FaceId) -> Walk {
    let mut edges = Vec::new();
    let mut faces = Vec::new();
    let mut current = start;
    let mut face = first_face;

    for _ in 0..MAX_LOOP_WALK {
        let Some(next) = cross_quad(mesh, face, current) else {
            break;
        };
        faces.push(face);
        if next.edge == start.edge {
            return Walk {
                edges,
                faces,
                closed: true,
            };
        }
        edges.push(next);

        let adjacent = mesh.faces_of_edge(next.edge);
        if adjacent.len() != 2 {
            break;
        }
        let Some(&beyond) = adjacent.iter().find(|&&g| g != face) else {
            break;
        };
        if !is_quad(mesh, beyond) || faces.contains(&beyond) {
            break;
        }
        current = next;
        face = beyond;
    }

    if edges.len() >= MAX_LOOP_WALK {
        warn!("find_edge_loop: walk from {} hit the step limit", start.edge);
    }
    Walk {
        edges,
        faces,
        closed: false,
    }
}

/// The edge opposite `edge` in quad `face`, oriented to match it
fn cross_quad(mesh: &Mesh, face: FaceId, edge: OrientedEdge) -> Option<OrientedEdge> {
    let opposite = mesh.opposite_edge_in_quad(face, edge.edge)?;
    let verts = mesh.face(face)?.vertices();
    let k = verts.iter().position(|&v| v == edge.from)?;
    let before = verts[(k + 3) % 4];
    let after = verts[(k + 1) % 4];
    // `from` has `to` on one side and its rail partner on the other
    let from = if after == edge.to { before } else { after };
    let (a, b) = mesh.edge_endpoints(opposite)?;
    let to = if a == from { b } else { a };
    Some(OrientedEdge {
        edge: opposite,
        from,
        to,
    })
}
