use crate::{
    adjacency::VertexAdjacency, math::Point3, normals::PackedNormal, util::parallel_map,
};

/// Computes one normal per point by summing the face-corner cross products
/// `cross(p[next] - p[i], p[prev] - p[i])` over all corners incident to the
/// point, then normalizing.
///
/// The cross products are not weighted any further. A point without
/// incident corners (or whose corners cancel out) gets a zero normal.
///
/// `num_points` is clamped to the adjacency table's point domain. Neighbors
/// that are not covered by `points` are ignored, as are points beyond
/// `points`, which get a zero normal.
pub fn compute_smooth_normals<P: Point3>(
    adjacency: &VertexAdjacency,
    num_points: usize,
    points: &[P],
) -> Vec<P> {
    let num_points = num_points.min(adjacency.num_points());
    parallel_map(num_points, |point| {
        accumulate_normal(adjacency, point, points).normalized_or_zero()
    })
}

/// Same as [`compute_smooth_normals()`] but stores [`PackedNormal`]s.
pub fn compute_packed_smooth_normals<P: Point3>(
    adjacency: &VertexAdjacency,
    num_points: usize,
    points: &[P],
) -> Vec<PackedNormal> {
    let num_points = num_points.min(adjacency.num_points());
    parallel_map(num_points, |point| {
        PackedNormal::from_point(&accumulate_normal(adjacency, point, points).normalized_or_zero())
    })
}

#[inline]
fn accumulate_normal<P: Point3>(adjacency: &VertexAdjacency, point: usize, points: &[P]) -> P {
    let mut normal = P::zero();
    let Some(&center) = points.get(point) else {
        return normal;
    };
    for (prev, next) in adjacency.neighbors(point) {
        if let (Some(&prev), Some(&next)) = (points.get(prev as usize), points.get(next as usize)) {
            normal += (next - center).cross(prev - center);
        }
    }
    normal
}
