//! Fixture: the cube [-1, 1]³ with a bore of radius 0.5 along z

#![allow(dead_code)]

use glam::DVec3;
use serde_json::json;
use trim_core::{CubeFace, CurveNetwork, Primitive, TrimConfig};

/// Planes x=±1, y=±1, z=±1 (ids 0..=5) and the bore cylinder (id 6)
pub fn primitives_json() -> String {
    json!([
        { "id": 0, "type": "plane", "params": [[1.0, 0.0, 0.0], 1.0], "err": 0.001 },
        { "id": 1, "type": "plane", "params": [[-1.0, 0.0, 0.0], 1.0], "err": 0.001 },
        { "id": 2, "type": "plane", "params": [[0.0, 1.0, 0.0], 1.0], "err": 0.001 },
        { "id": 3, "type": "plane", "params": [[0.0, -1.0, 0.0], 1.0], "err": 0.001 },
        { "id": 4, "type": "plane", "params": [[[0.0, 0.0, 1.0]], 1.0], "err": 0.001 },
        { "id": 5, "type": "plane", "params": [[[0.0, 0.0, -1.0]], 1.0], "err": 0.001 },
        { "id": 6, "type": "cylinder", "params": [[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], 0.5], "err": 0.001 }
    ])
    .to_string()
}

pub fn polyline(a: DVec3, b: DVec3) -> serde_json::Value {
    let points: Vec<[f64; 3]> = (0..5)
        .map(|i| a.lerp(b, i as f64 / 4.0).to_array())
        .collect();
    json!({ "pv_points": points, "pv_lines": [[0, 1], [1, 2], [2, 3], [3, 4]] })
}

pub fn circle(center: DVec3, radius: f64) -> serde_json::Value {
    let n = 32;
    let points: Vec<[f64; 3]> = (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            (center + DVec3::new(angle.cos(), angle.sin(), 0.0) * radius).to_array()
        })
        .collect();
    let lines: Vec<[usize; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
    json!({ "pv_points": points, "lines": lines })
}

/// The 12 cube edges (curves 0..=11) followed by the two bore rims
pub fn curve_values() -> Vec<serde_json::Value> {
    let p = DVec3::new;
    vec![
        // Along x
        polyline(p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0)),
        polyline(p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0)),
        polyline(p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0)),
        polyline(p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0)),
        // Along y
        polyline(p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0)),
        polyline(p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0)),
        polyline(p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0)),
        polyline(p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0)),
        // Along z
        polyline(p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)),
        polyline(p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0)),
        polyline(p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0)),
        polyline(p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0)),
        // Bore rims
        circle(p(0.0, 0.0, 1.0), 0.5),
        circle(p(0.0, 0.0, -1.0), 0.5),
    ]
}

pub fn curves_json(curves: Vec<serde_json::Value>) -> String {
    json!({ "curves": curves }).to_string()
}

pub fn network() -> CurveNetwork {
    trim_core::input::parse_curve_network(&curves_json(curve_values())).unwrap()
}

pub fn primitives() -> Vec<Primitive> {
    trim_core::input::parse_primitives(&primitives_json()).unwrap()
}

pub fn config() -> TrimConfig {
    TrimConfig {
        cube_faces: vec![
            CubeFace::new("top", &[0, 1, 4, 5]),
            CubeFace::new("bottom", &[2, 3, 6, 7]),
            CubeFace::new("right", &[4, 6, 8, 10]),
            CubeFace::new("left", &[5, 7, 9, 11]),
            CubeFace::new("front", &[0, 2, 8, 9]),
            CubeFace::new("back", &[1, 3, 10, 11]),
        ],
        ..Default::default()
    }
}

/// Total area of a tessellated mesh
pub fn mesh_area(mesh: &trim_cad::TessellatedMesh) -> f64 {
    mesh.indices
        .chunks(3)
        .map(|t| {
            let v = |i: u32| {
                let [x, y, z] = mesh.vertices[i as usize];
                DVec3::new(x as f64, y as f64, z as f64)
            };
            let (a, b, c) = (v(t[0]), v(t[1]), v(t[2]));
            (b - a).cross(c - a).length() * 0.5
        })
        .sum()
}
