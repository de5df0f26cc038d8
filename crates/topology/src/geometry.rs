//! Small geometric helpers shared by the store and the editing operators.

use glam::DVec3;
use polyforge_config::DEFAULT_EPSILON;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any included point will replace
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::MAX),
            max: DVec3::splat(f64::MIN),
        }
    }

    /// Smallest box containing both points
    pub fn from_segment(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(*p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include_point(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: self.min - DVec3::splat(margin),
            max: self.max + DVec3::splat(margin),
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Normal of a polygon from the cross product of its first two edge vectors,
/// falling back to Newell's method when the leading corner is degenerate.
pub fn polygon_normal(points: &[DVec3]) -> Option<DVec3> {
    if points.len() < 3 {
        return None;
    }

    let first = (points[1] - points[0]).cross(points[2] - points[1]);
    if first.length_squared() > DEFAULT_EPSILON * DEFAULT_EPSILON {
        return Some(first.normalize());
    }

    let mut newell = DVec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        newell.x += (p.y - q.y) * (p.z + q.z);
        newell.y += (p.z - q.z) * (p.x + q.x);
        newell.z += (p.x - q.x) * (p.y + q.y);
    }
    newell.try_normalize()
}

/// Arithmetic mean of the points, `None` for an empty slice
pub fn centroid(points: &[DVec3]) -> Option<DVec3> {
    if points.is_empty() {
        return None;
    }
    let sum: DVec3 = points.iter().copied().sum();
    Some(sum / points.len() as f64)
}

/// A unit vector perpendicular to `direction`.
///
/// Crosses with +Y, switching to +X when `direction` is (anti)parallel to +Y so
/// the cross product never collapses to zero.
pub fn perpendicular(direction: DVec3) -> Option<DVec3> {
    let dir = direction.try_normalize()?;
    let candidate = dir.cross(DVec3::Y);
    if candidate.length_squared() > 1e-12 {
        return Some(candidate.normalize());
    }
    dir.cross(DVec3::X).try_normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polygon_normal_ccw_square() {
        let pts = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let n = polygon_normal(&pts).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_normal_collinear_leading_corner() {
        // First three points are collinear; Newell still finds +Z
        let pts = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];
        let n = polygon_normal(&pts).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_perpendicular_handles_up_axis() {
        let p = perpendicular(DVec3::Y).unwrap();
        assert_relative_eq!(p.dot(DVec3::Y), 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.length(), 1.0, epsilon = 1e-12);

        let q = perpendicular(DVec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(q.dot(DVec3::X), 0.0, epsilon = 1e-12);
        assert!(perpendicular(DVec3::ZERO).is_none());
    }

    #[test]
    fn test_aabb_segment_overlap() {
        let a = Aabb::from_segment(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::from_segment(DVec3::splat(0.5), DVec3::splat(2.0));
        let c = Aabb::from_segment(DVec3::splat(3.0), DVec3::splat(4.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.expanded(2.5).intersects(&c));
        assert!(Aabb::empty().is_empty());
    }
}
