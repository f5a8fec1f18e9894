//! Planar convex polygon helpers
//!
//! Used to evaluate the intersection of coplanar planar faces, which is the
//! only face boolean the trimming pipeline needs to resolve geometrically.

use glam::DVec3;

/// Newell normal of a polygon (not normalized, zero for degenerate input)
pub fn newell_normal(points: &[DVec3]) -> DVec3 {
    let n = points.len();
    let mut normal = DVec3::ZERO;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Check whether two polygons lie in the same plane within `tolerance`
pub fn are_coplanar(a: &[DVec3], b: &[DVec3], tolerance: f64) -> bool {
    let (Some(na), Some(nb)) = (
        newell_normal(a).try_normalize(),
        newell_normal(b).try_normalize(),
    ) else {
        return false;
    };
    if !crate::math::are_parallel(na, nb, tolerance) {
        return false;
    }
    b.iter()
        .all(|p| crate::math::signed_distance_to_plane(*p, na, a[0]).abs() <= tolerance)
}

/// Clip `subject` against the convex polygon `clipper` (Sutherland-Hodgman)
///
/// Both polygons must be coplanar. The winding of `clipper` is taken from its
/// own Newell normal, so either orientation works. Returns an empty vector when
/// the polygons do not overlap.
pub fn clip_convex(subject: &[DVec3], clipper: &[DVec3], tolerance: f64) -> Vec<DVec3> {
    let Some(normal) = newell_normal(clipper).try_normalize() else {
        return Vec::new();
    };

    let mut output: Vec<DVec3> = subject.to_vec();
    let m = clipper.len();
    for i in 0..m {
        if output.is_empty() {
            break;
        }
        let edge_start = clipper[i];
        let edge_dir = clipper[(i + 1) % m] - edge_start;
        // Positive on the inner side of the edge
        let side = |p: DVec3| edge_dir.cross(p - edge_start).dot(normal);

        let input = std::mem::take(&mut output);
        let n = input.len();
        for j in 0..n {
            let current = input[j];
            let next = input[(j + 1) % n];
            let d_current = side(current);
            let d_next = side(next);
            let current_inside = d_current >= -tolerance;
            let next_inside = d_next >= -tolerance;

            if current_inside {
                output.push(current);
            }
            if current_inside != next_inside {
                let t = d_current / (d_current - d_next);
                output.push(current.lerp(next, t));
            }
        }
    }

    dedup_points(output, tolerance)
}

/// Remove consecutive duplicate points (including last/first)
fn dedup_points(points: Vec<DVec3>, tolerance: f64) -> Vec<DVec3> {
    let mut result: Vec<DVec3> = Vec::with_capacity(points.len());
    for p in points {
        if result
            .last()
            .is_none_or(|last: &DVec3| (*last - p).length() > tolerance)
        {
            result.push(p);
        }
    }
    while result.len() > 1 && (result[0] - result[result.len() - 1]).length() <= tolerance {
        result.pop();
    }
    result
}

/// Area of a planar polygon
pub fn area(points: &[DVec3]) -> f64 {
    newell_normal(points).length() * 0.5
}
