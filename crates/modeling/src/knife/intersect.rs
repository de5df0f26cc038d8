//! Cut path against mesh edge intersection.

use glam::DVec3;
use polyforge_config::DEFAULT_EPSILON;
use topology::{Aabb, EdgeId, Mesh, VertexId};
use tracing::trace;

/// Closest approach of a cut segment and an edge that counts as a crossing
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentHit {
    /// Parameter along the cut segment
    pub s: f64,
    /// Parameter along the edge, from its first endpoint
    pub t: f64,
    /// Crossing point on the edge
    pub point: DVec3,
}

/// Where a cut crosses the mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum HitTarget {
    /// Within tolerance of an existing vertex
    Vertex(VertexId),
    /// Strictly inside an edge at parameter `t`
    Edge { edge: EdgeId, t: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hit {
    /// Segment index plus the parameter along that segment
    pub order: f64,
    pub target: HitTarget,
    pub point: DVec3,
}

/// Intersect segment `p0 -> p1` with segment `q0 -> q1`.
///
/// Uses the closest-approach parameters of the two carrier lines:
/// `s = ((q0 - p0) x d2) . n / |n|^2` and `t = ((q0 - p0) x d1) . n / |n|^2`
/// with `n = d1 x d2`. Both parameters must fall in `[0, 1]` up to
/// `tolerance` (measured as a distance) and the closest points must be within
/// `tolerance` of each other. Parallel segments never intersect.
pub(crate) fn intersect_segments(
    p0: DVec3,
    p1: DVec3,
    q0: DVec3,
    q1: DVec3,
    tolerance: f64,
) -> Option<SegmentHit> {
    let d1 = p1 - p0;
    let d2 = q1 - q0;
    let len1 = d1.length();
    let len2 = d2.length();
    if len1 <= DEFAULT_EPSILON || len2 <= DEFAULT_EPSILON {
        return None;
    }

    let n = d1.cross(d2);
    let nn = n.length_squared();
    if nn <= DEFAULT_EPSILON * len1 * len1 * len2 * len2 {
        return None;
    }

    let r = q0 - p0;
    let s = r.cross(d2).dot(n) / nn;
    let t = r.cross(d1).dot(n) / nn;

    let s_slack = tolerance / len1;
    let t_slack = tolerance / len2;
    if s < -s_slack || s > 1.0 + s_slack || t < -t_slack || t > 1.0 + t_slack {
        return None;
    }

    let s = s.clamp(0.0, 1.0);
    let t = t.clamp(0.0, 1.0);
    let on_cut = p0 + d1 * s;
    let on_edge = q0 + d2 * t;
    if on_cut.distance(on_edge) > tolerance {
        return None;
    }

    Some(SegmentHit {
        s,
        t,
        point: on_edge,
    })
}

struct EdgeSpan {
    edge: EdgeId,
    v1: VertexId,
    v2: VertexId,
    p1: DVec3,
    p2: DVec3,
    bounds: Aabb,
}

/// Every crossing of the cut path with the mesh's edges, in path order.
///
/// Hits within `tolerance` of an edge endpoint resolve to that vertex. A
/// vertex reached through several of its edges, or an edge crossed exactly at
/// a path point, is reported once.
pub(crate) fn collect_hits(mesh: &Mesh, path: &[DVec3], closed: bool, tolerance: f64) -> Vec<Hit> {
    let spans: Vec<EdgeSpan> = mesh
        .edges()
        .filter_map(|(id, edge)| {
            let p1 = mesh.position(edge.v1)?;
            let p2 = mesh.position(edge.v2)?;
            Some(EdgeSpan {
                edge: id,
                v1: edge.v1,
                v2: edge.v2,
                p1,
                p2,
                bounds: Aabb::from_segment(p1, p2).expanded(tolerance),
            })
        })
        .collect();

    let mut segments: Vec<(DVec3, DVec3)> = path.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && path.len() > 2 {
        segments.push((path[path.len() - 1], path[0]));
    }

    let mut hits = Vec::new();
    for (index, &(a, b)) in segments.iter().enumerate() {
        let reach = Aabb::from_segment(a, b).expanded(tolerance);
        for span in spans.iter().filter(|s| s.bounds.intersects(&reach)) {
            let Some(hit) = intersect_segments(a, b, span.p1, span.p2, tolerance) else {
                continue;
            };
            let target = if hit.point.distance(span.p1) <= tolerance {
                HitTarget::Vertex(span.v1)
            } else if hit.point.distance(span.p2) <= tolerance {
                HitTarget::Vertex(span.v2)
            } else {
                HitTarget::Edge {
                    edge: span.edge,
                    t: hit.t,
                }
            };
            let point = match target {
                HitTarget::Vertex(v) => mesh.position(v).unwrap_or(hit.point),
                HitTarget::Edge { .. } => hit.point,
            };
            hits.push(Hit {
                order: index as f64 + hit.s,
                target,
                point,
            });
        }
    }

    hits.sort_by(|x, y| x.order.total_cmp(&y.order));
    let mut unique: Vec<Hit> = Vec::with_capacity(hits.len());
    for hit in hits {
        if unique
            .last()
            .is_some_and(|prev| same_place(prev, &hit, tolerance))
        {
            continue;
        }
        unique.push(hit);
    }
    if closed && unique.len() > 1 {
        let (first, last) = (unique[0], unique[unique.len() - 1]);
        if same_place(&first, &last, tolerance) {
            unique.pop();
        }
    }

    trace!(
        "collect_hits: {} segments, {} edges, {} hits",
        segments.len(),
        spans.len(),
        unique.len()
    );
    unique
}

fn same_place(a: &Hit, b: &Hit, tolerance: f64) -> bool {
    match (a.target, b.target) {
        (HitTarget::Vertex(x), HitTarget::Vertex(y)) => x == y,
        (HitTarget::Edge { edge: x, .. }, HitTarget::Edge { edge: y, .. }) => {
            x == y && a.point.distance(b.point) <= tolerance
        }
        _ => false,
    }
}
