//! Mesh editing operators for Polyforge.
//!
//! Every operator works on a [`topology::Mesh`] and stages its changes in a
//! [`topology::MeshEdit`], so the mesh is either fully updated or untouched.
//!
//! ## Operators
//!
//! - **Bevel**: offset ramps around an edge, a vertex or a face
//! - **Bridge**: connecting geometry between edges, edge chains or faces
//! - **Edge loops**: quad-ring traversal and loop cuts
//! - **Knife**: cutting faces along polylines, lines and circles
//! - **Simplify**: greedy edge collapse toward a vertex budget
//!
//! Bevel, single-target bridge and simplification return [`Result`] and fail
//! before touching the mesh. Loop cuts, knife cuts and batch bridges report
//! failures inside their result structs.

pub mod bevel;
pub mod bridge;
pub mod edge_loop;
pub mod error;
pub mod knife;
pub mod loop_cut;
pub mod simplify;

pub use bevel::{BevelOptions, BevelResult, BevelTarget, bevel, bevel_by_kind, bevel_edge, bevel_face, bevel_vertex};
pub use bridge::{
    BridgeBatchResult, BridgeFailure, BridgeOptions, BridgeResult, bridge_edge_sequence,
    bridge_edges, bridge_faces, bridge_selected_edges,
};
pub use edge_loop::{EdgeLoop, OrientedEdge, find_edge_loop};
pub use error::{ModelingError, Result};
pub use knife::{CutStats, KnifeLine, KnifeOptions, KnifeResult, knife_circle, knife_cut, knife_cut_lines};
pub use loop_cut::{
    LoopCutOptions, LoopCutResult, MultiLoopCutResult, cut_edge_loop, cut_multiple_loops,
    cut_selected_loops,
};
pub use simplify::{SimplifyOptions, SimplifyResult, StopReason, simplify, simplify_with};
