//! Mesh simplification by greedy edge collapse.

mod cost;

use std::collections::HashSet;
use std::fmt;

use glam::DVec3;
use polyforge_config::{BOUNDARY_EDGE_COST, DEFAULT_SIMPLIFY_MAX_PASSES, DEFAULT_SIMPLIFY_RATIO};
use serde::{Deserialize, Serialize};
use topology::{EdgeId, Mesh};
use tracing::{debug, info, trace};

use crate::error::{ModelingError, Result};

pub use cost::{edge_cost, rank_edges};

/// Configuration for simplification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyOptions {
    /// Fraction of vertices to keep, in (0, 1] (default: 0.5)
    pub target_ratio: f64,
    /// Cost added to boundary edges (default: 1000.0)
    pub boundary_cost: f64,
    /// Apply `boundary_cost` to edges with a single face (default: true)
    pub preserve_boundary: bool,
    /// Stop once the cheapest remaining edge costs more than this
    pub max_error: Option<f64>,
    /// Upper bound on collapse passes (default: 64)
    pub max_passes: usize,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            target_ratio: DEFAULT_SIMPLIFY_RATIO,
            boundary_cost: BOUNDARY_EDGE_COST,
            preserve_boundary: true,
            max_error: None,
            max_passes: DEFAULT_SIMPLIFY_MAX_PASSES,
        }
    }
}

/// Why simplification stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    TargetReached,
    /// A full pass found nothing to collapse
    NoCollapses,
    /// The cheapest remaining edge exceeded `max_error`
    MaxError,
    MaxPasses,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TargetReached => "target reached",
            Self::NoCollapses => "no collapsible edges",
            Self::MaxError => "error bound exceeded",
            Self::MaxPasses => "pass limit reached",
        };
        f.write_str(text)
    }
}

/// Outcome of a simplification run
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifyResult {
    pub original_vertices: usize,
    pub target_vertices: usize,
    pub final_vertices: usize,
    pub collapses: usize,
    pub passes: usize,
    pub faces_removed: usize,
    pub stop_reason: StopReason,
}

/// Simplify by collapsing edges to their midpoints
pub fn simplify(mesh: &mut Mesh, options: &SimplifyOptions) -> Result<SimplifyResult> {
    simplify_with(mesh, options, |mesh, e| mesh.edge_midpoint(e))
}

/// Simplify with a caller-chosen collapse position.
///
/// `position` is asked for every collapse; `None` falls back to the edge
/// midpoint.
pub fn simplify_with<F>(mesh: &mut Mesh, options: &SimplifyOptions, mut position: F) -> Result<SimplifyResult>
where
    F: FnMut(&Mesh, EdgeId) -> Option<DVec3>,
{
    trace!("simplify: START ratio={}", options.target_ratio);

    // ========================================================================
    // PHASE 1: VALIDATE (fail early)
    // ========================================================================
    let ratio = options.target_ratio;
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        return Err(ModelingError::invalid(
            "target_ratio",
            format!("{} is outside (0, 1]", ratio),
        ));
    }
    if let Some(max) = options.max_error {
        if !max.is_finite() || max < 0.0 {
            return Err(ModelingError::invalid("max_error", "must be finite and non-negative"));
        }
    }

    let original = mesh.vertex_count();
    let target = ((original as f64 * ratio).ceil() as usize).min(original);

    // ========================================================================
    // PHASE 2: COLLAPSE in greedy passes
    // ========================================================================
    let mut collapses = 0;
    let mut faces_removed = 0;
    let mut passes = 0;
    let mut stop = StopReason::MaxPasses;

    if mesh.vertex_count() <= target {
        stop = StopReason::TargetReached;
    } else {
        while passes < options.max_passes {
            let ranked = rank_edges(mesh, options);
            let mut consumed = HashSet::new();
            let mut this_pass = 0;
            let mut over_budget = false;

            for (e, cost) in ranked {
                if mesh.vertex_count() <= target {
                    break;
                }
                if options.max_error.is_some_and(|max| cost > max) {
                    over_budget = true;
                    break;
                }
                let Some((a, b)) = mesh.edge_endpoints(e) else {
                    continue;
                };
                if consumed.contains(&a) || consumed.contains(&b) {
                    continue;
                }
                let Some(p) = position(mesh, e).or_else(|| mesh.edge_midpoint(e)) else {
                    continue;
                };
                let outcome = mesh.collapse_edge(e, p)?;
                consumed.insert(outcome.kept);
                consumed.insert(outcome.removed);
                faces_removed += outcome.faces_removed;
                this_pass += 1;
            }

            passes += 1;
            collapses += this_pass;
            trace!("simplify: pass {} collapsed {} edges", passes, this_pass);

            if mesh.vertex_count() <= target {
                stop = StopReason::TargetReached;
                break;
            }
            if over_budget {
                stop = StopReason::MaxError;
                break;
            }
            if this_pass == 0 {
                stop = StopReason::NoCollapses;
                break;
            }
        }
    }

    let final_vertices = mesh.vertex_count();
    info!(
        "simplify: {} -> {} vertices (target {}), stopped: {}",
        original, final_vertices, target, stop
    );
    debug!(
        "simplify: {} collapses over {} passes, -{} faces",
        collapses, passes, faces_removed
    );

    Ok(SimplifyResult {
        original_vertices: original,
        target_vertices: target,
        final_vertices,
        collapses,
        passes,
        faces_removed,
        stop_reason: stop,
    })
}
