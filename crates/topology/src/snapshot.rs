//! Position snapshots for off-thread processing.
//!
//! A snapshot copies vertex positions into a flat `Pod` buffer that can be
//! handed to a worker or uploaded as raw bytes. Writing it back is
//! all-or-nothing and is refused once the mesh topology has changed.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;

use crate::mesh::Mesh;
use crate::types::{Result, TopologyError, VertexId};

/// One vertex position, padded to 32 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PackedPosition {
    pub xyz: [f64; 3],
    pub _pad: f64,
}

impl PackedPosition {
    pub fn new(p: DVec3) -> Self {
        Self {
            xyz: p.to_array(),
            _pad: 0.0,
        }
    }

    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.xyz)
    }
}

#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    ids: Vec<VertexId>,
    pub positions: Vec<PackedPosition>,
    revision: u64,
}

impl PositionSnapshot {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Topology revision the snapshot was taken at
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Overwrite the positions from a raw buffer of the same size
    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = std::mem::size_of_val(self.positions.as_slice());
        if bytes.len() != expected {
            return Err(TopologyError::SnapshotSize {
                expected,
                actual: bytes.len(),
            });
        }
        bytemuck::cast_slice_mut::<PackedPosition, u8>(&mut self.positions).copy_from_slice(bytes);
        Ok(())
    }
}

impl Mesh {
    /// Copy all vertex positions, in slot order
    pub fn snapshot_positions(&self) -> PositionSnapshot {
        let (ids, positions) = self
            .vertices()
            .map(|(id, v)| (id, PackedPosition::new(v.position)))
            .unzip();
        PositionSnapshot {
            ids,
            positions,
            revision: self.topology_revision(),
        }
    }

    /// Write snapshot positions back. Fails without changing anything if the
    /// topology changed since the snapshot was taken.
    pub fn apply_position_snapshot(&mut self, snapshot: &PositionSnapshot) -> Result<()> {
        if snapshot.revision != self.topology_revision() {
            return Err(TopologyError::StaleSnapshot {
                snapshot: snapshot.revision,
                mesh: self.topology_revision(),
            });
        }
        for (&id, packed) in snapshot.ids.iter().zip(&snapshot.positions) {
            self.set_vertex_position(id, packed.position())?;
        }
        Ok(())
    }
}
