//! Shared configuration for Polyforge
//!
//! This crate provides the single source of truth for geometric tolerances,
//! cost constants and operator defaults shared by the `topology` and
//! `modeling` crates.

use serde::{Deserialize, Serialize};

/// Length below which a vector is treated as zero
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Parameter/distance tolerance for knife segment intersection tests
pub const DEFAULT_KNIFE_TOLERANCE: f64 = 1e-6;

/// Grid size used when welding coincident vertices
pub const DEFAULT_MERGE_TOLERANCE: f64 = 1e-6;

/// Cost added to boundary edges during simplification so they collapse last
pub const BOUNDARY_EDGE_COST: f64 = 1000.0;

/// Default bevel offset distance
pub const DEFAULT_BEVEL_DISTANCE: f64 = 0.1;

/// Default number of bevel rings
pub const DEFAULT_BEVEL_SEGMENTS: u32 = 1;

/// Default fraction of vertices kept by simplification
pub const DEFAULT_SIMPLIFY_RATIO: f64 = 0.5;

/// Upper bound on greedy simplification passes
pub const DEFAULT_SIMPLIFY_MAX_PASSES: usize = 64;

/// Safety limit for quad-ring walks (guards against corrupted cycles)
pub const MAX_LOOP_WALK: usize = 100_000;

/// Default sample count for knife circles
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 32;

/// Geometric tolerances used across the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Vectors shorter than this are considered degenerate
    pub epsilon: f64,
    /// Intersection parameter/distance tolerance
    pub intersection: f64,
    /// Vertex welding grid size
    pub merge: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            intersection: DEFAULT_KNIFE_TOLERANCE,
            merge: DEFAULT_MERGE_TOLERANCE,
        }
    }
}

impl ToleranceConfig {
    /// Create a config that uses one tolerance for intersections and welding
    pub fn uniform(tolerance: f64) -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            intersection: tolerance,
            merge: tolerance,
        }
    }

    /// Check that every tolerance is finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.epsilon, self.intersection, self.merge]
            .iter()
            .all(|t| t.is_finite() && *t >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToleranceConfig::default();
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.intersection, DEFAULT_KNIFE_TOLERANCE);
        assert_eq!(config.merge, DEFAULT_MERGE_TOLERANCE);
        assert!(config.is_valid());
    }

    #[test]
    fn test_uniform_config() {
        let config = ToleranceConfig::uniform(0.01);
        assert_eq!(config.intersection, 0.01);
        assert_eq!(config.merge, 0.01);
    }

    #[test]
    fn test_negative_tolerance_is_invalid() {
        let config = ToleranceConfig {
            merge: -1.0,
            ..Default::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ToleranceConfig::uniform(0.5);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ToleranceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
