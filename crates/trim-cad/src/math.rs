//! Vector helpers shared by the kernel backends and the trimming engine

use glam::DVec3;

/// Default tolerance for parallelism tests and normal comparison
pub const ARITHMETIC_TOLERANCE: f64 = 0.001;

/// Signed distance of `point` to the plane through `plane_point` with unit `normal`
pub fn signed_distance_to_plane(point: DVec3, normal: DVec3, plane_point: DVec3) -> f64 {
    (point - plane_point).dot(normal)
}

/// Check whether two directions are parallel (or antiparallel) within `tolerance`
///
/// The test is `|u × v| <= tolerance`, so it is only scale-free for unit vectors.
pub fn are_parallel(u: DVec3, v: DVec3, tolerance: f64) -> bool {
    u.cross(v).length() <= tolerance
}

/// Normalize a vector, leaving the zero vector untouched
pub fn normalize_or_keep_zero(v: DVec3) -> DVec3 {
    if v.length() > 0.0 { v.normalize() } else { v }
}

/// Distance of `point` to the infinite line through `origin` along unit `direction`
pub fn distance_to_axis(point: DVec3, origin: DVec3, direction: DVec3) -> f64 {
    (point - origin).cross(direction).length()
}

/// Orthonormal basis `(u, v)` spanning the plane with the given unit normal
pub fn plane_basis(normal: DVec3) -> (DVec3, DVec3) {
    let up = if normal.z.abs() < 0.9 { DVec3::Z } else { DVec3::X };
    let u = normal.cross(up).normalize();
    let v = normal.cross(u);
    (u, v)
}
