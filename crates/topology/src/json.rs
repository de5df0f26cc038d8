//! JSON interchange format for meshes.
//!
//! Elements are referenced by position in their arrays, so a document is
//! independent of the handles of the mesh it was written from. The matrix is
//! stored column-major.

use std::collections::HashMap;

use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::mesh::Mesh;
use crate::types::{Edge, EdgeId, Face, Result, TopologyError, Vertex, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Json {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<DVec3> for Vec3Json {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Json> for DVec3 {
    fn from(v: Vec3Json) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvJson {
    pub u: f64,
    pub v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexJson {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Vec3Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<UvJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeJson {
    pub v1: usize,
    pub v2: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceJson {
    pub vertices: Vec<usize>,
    /// Empty means "derive from the vertex loop"
    #[serde(default)]
    pub edges: Vec<usize>,
    #[serde(default)]
    pub material_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Vec3Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
}

fn identity_matrix() -> [f64; 16] {
    DMat4::IDENTITY.to_cols_array()
}

/// Serialized mesh document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshJson {
    /// Identity of the exporting mesh; imports always get a fresh one
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub vertices: Vec<VertexJson>,
    #[serde(default)]
    pub edges: Vec<EdgeJson>,
    #[serde(default)]
    pub faces: Vec<FaceJson>,
    #[serde(default = "identity_matrix")]
    pub matrix: [f64; 16],
}

fn lookup<T: Copy>(ids: &[T], index: usize, kind: &'static str) -> Result<T> {
    ids.get(index).copied().ok_or(TopologyError::IndexOutOfRange {
        kind,
        index,
        len: ids.len(),
    })
}

impl Mesh {
    /// Export to the positional JSON schema (slot order)
    pub fn to_json(&self) -> MeshJson {
        let vertex_index: HashMap<VertexId, usize> =
            self.vertex_ids().enumerate().map(|(i, v)| (v, i)).collect();
        let edge_index: HashMap<EdgeId, usize> =
            self.edge_ids().enumerate().map(|(i, e)| (e, i)).collect();

        let vertices = self
            .vertices()
            .map(|(_, v)| VertexJson {
                x: v.position.x,
                y: v.position.y,
                z: v.position.z,
                normal: v.normal.map(Vec3Json::from),
                uv: v.uv.map(|uv| UvJson { u: uv.x, v: uv.y }),
                user_data: v.user_data.clone(),
            })
            .collect();

        let edges = self
            .edges()
            .map(|(_, e)| EdgeJson {
                v1: vertex_index[&e.v1],
                v2: vertex_index[&e.v2],
                user_data: e.user_data.clone(),
            })
            .collect();

        let faces = self
            .faces()
            .map(|(_, f)| FaceJson {
                vertices: f.vertices().iter().map(|v| vertex_index[v]).collect(),
                edges: f.edges().iter().map(|e| edge_index[e]).collect(),
                material_index: f.material_index,
                normal: f.normal.map(Vec3Json::from),
                user_data: f.user_data.clone(),
            })
            .collect();

        MeshJson {
            id: self.id().0,
            name: self.name.clone(),
            vertices,
            edges,
            faces,
            matrix: self.transform.to_cols_array(),
        }
    }

    /// Build a mesh from the positional JSON schema.
    ///
    /// Every index is range-checked and every face goes through
    /// [`Mesh::add_face`]. Out-of-range indices and mismatched face edges
    /// reject the document as a whole; faces with fewer than three distinct
    /// vertices are skipped.
    pub fn from_json(doc: &MeshJson) -> Result<Mesh> {
        let mut mesh = Mesh::new(doc.name.clone());
        mesh.transform = DMat4::from_cols_array(&doc.matrix);

        let mut vertex_ids = Vec::with_capacity(doc.vertices.len());
        for v in &doc.vertices {
            let mut vertex = Vertex::new(DVec3::new(v.x, v.y, v.z));
            vertex.normal = v.normal.map(DVec3::from);
            vertex.uv = v.uv.map(|uv| DVec2::new(uv.u, uv.v));
            vertex.user_data = v.user_data.clone();
            vertex_ids.push(mesh.add_vertex(vertex));
        }

        let mut edge_ids = Vec::with_capacity(doc.edges.len());
        for e in &doc.edges {
            let mut edge = Edge::new(
                lookup(&vertex_ids, e.v1, "vertices")?,
                lookup(&vertex_ids, e.v2, "vertices")?,
            );
            edge.user_data = e.user_data.clone();
            edge_ids.push(mesh.add_edge(edge)?);
        }

        for (index, f) in doc.faces.iter().enumerate() {
            let vertices = f
                .vertices
                .iter()
                .map(|&i| lookup(&vertex_ids, i, "vertices"))
                .collect::<Result<Vec<_>>>()?;
            let mut face = Face::new(vertices).with_material(f.material_index);
            if !f.edges.is_empty() {
                let edges = f
                    .edges
                    .iter()
                    .map(|&i| lookup(&edge_ids, i, "edges"))
                    .collect::<Result<Vec<_>>>()?;
                face = face.with_edges(edges);
            }
            face.normal = f.normal.map(DVec3::from);
            face.user_data = f.user_data.clone();
            match mesh.add_face(face) {
                Ok(_) => {}
                Err(TopologyError::DegenerateFace { distinct }) => {
                    warn!(
                        "from_json: dropping face {} with {} distinct vertices",
                        index, distinct
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(mesh)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json())?)
    }

    pub fn from_json_str(s: &str) -> Result<Mesh> {
        let doc: MeshJson = serde_json::from_str(s)?;
        Self::from_json(&doc)
    }
}
