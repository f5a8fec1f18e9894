//! Geometry kernel trait definitions
//!
//! These traits define the interface that all geometry kernels must implement.
//! The trimming engine only talks to this interface; shapes are opaque handles.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Topological class of a shape handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A bounded surface patch
    Face,
    /// A closed volume
    Solid,
    /// A container of independent shapes
    Compound,
}

impl ShapeKind {
    /// Kind of the result of a boolean between shapes of kinds `self` and `other`
    pub fn combine(self, other: ShapeKind) -> ShapeKind {
        self.max(other)
    }
}

/// Opaque handle to a shape stored in a kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier
    pub id: Uuid,
    /// Topological class
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a handle for a freshly stored shape
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    /// Check if this shape is a face
    pub fn is_face(&self) -> bool {
        self.kind == ShapeKind::Face
    }
}

/// A closed 3D wire extracted from the outer boundary of a face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Wire3D {
    /// Straight segments between consecutive points (implicitly closed)
    Polygon(Vec<DVec3>),
    /// Full circle
    Circle {
        center: DVec3,
        normal: DVec3,
        radius: f64,
    },
}

impl Wire3D {
    /// Sample `count` points along the wire, starting at its first vertex
    ///
    /// Polygons are sampled uniformly by arc length so that two wires with
    /// different vertex counts can be paired point by point.
    pub fn sample(&self, count: usize) -> Vec<DVec3> {
        match self {
            Wire3D::Circle {
                center,
                normal,
                radius,
            } => {
                let (u, v) = crate::math::plane_basis(*normal);
                (0..count)
                    .map(|i| {
                        let angle = (i as f64 / count as f64) * std::f64::consts::TAU;
                        *center + (u * angle.cos() + v * angle.sin()) * *radius
                    })
                    .collect()
            }
            Wire3D::Polygon(points) => {
                let n = points.len();
                if n == 0 || count == 0 {
                    return Vec::new();
                }
                let lengths: Vec<f64> = (0..n)
                    .map(|i| (points[(i + 1) % n] - points[i]).length())
                    .collect();
                let perimeter: f64 = lengths.iter().sum();
                if perimeter <= 0.0 {
                    return vec![points[0]; count];
                }

                let mut samples = Vec::with_capacity(count);
                let mut edge = 0;
                let mut walked = 0.0;
                for i in 0..count {
                    let target = perimeter * i as f64 / count as f64;
                    while edge + 1 < n && walked + lengths[edge] < target {
                        walked += lengths[edge];
                        edge += 1;
                    }
                    let t = if lengths[edge] > 0.0 {
                        ((target - walked) / lengths[edge]).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    samples.push(points[edge].lerp(points[(edge + 1) % n], t));
                }
                samples
            }
        }
    }

    /// Number of samples needed to follow the wire within `tolerance`
    pub fn sample_count(&self, tolerance: f64) -> usize {
        match self {
            Wire3D::Polygon(points) => points.len().max(3),
            Wire3D::Circle { radius, .. } => circle_segments(*radius, tolerance),
        }
    }

    /// Circle center, or the vertex centroid of a polygon
    pub fn center(&self) -> DVec3 {
        match self {
            Wire3D::Circle { center, .. } => *center,
            Wire3D::Polygon(points) if points.is_empty() => DVec3::ZERO,
            Wire3D::Polygon(points) => {
                points.iter().copied().sum::<DVec3>() / points.len() as f64
            }
        }
    }

    /// Unit normal of the wire's plane, oriented by its winding
    pub fn normal(&self) -> DVec3 {
        match self {
            Wire3D::Circle { normal, .. } => normal.normalize_or_zero(),
            Wire3D::Polygon(points) => super::polygon::newell_normal(points).normalize_or_zero(),
        }
    }
}

/// Sample two wires so that sample `i` of `a` faces sample `i` of `b`
///
/// `b` starts in the direction of `a`'s first sample projected onto `b`'s
/// plane and winds the same way as `a` about their common direction. Ruling
/// lines joining the pairs then run between matching sides of both wires.
pub fn sample_matched(a: &Wire3D, b: &Wire3D, count: usize) -> (Vec<DVec3>, Vec<DVec3>) {
    let from = a.sample(count);
    let Some(&first) = from.first() else {
        return (from, Vec::new());
    };

    let normal = b.normal();
    let offset = first - a.center();
    let start = (offset - normal * offset.dot(normal)).try_normalize();

    let mut to = match (b, start) {
        (
            Wire3D::Circle {
                center, radius, ..
            },
            Some(u),
        ) => {
            let v = normal.cross(u);
            (0..count)
                .map(|i| {
                    let angle = (i as f64 / count as f64) * std::f64::consts::TAU;
                    *center + (u * angle.cos() + v * angle.sin()) * *radius
                })
                .collect()
        }
        (Wire3D::Polygon(_), Some(u)) => {
            let mut samples = b.sample(count);
            let center = b.center();
            let alignment = |p: &DVec3| (*p - center).normalize_or_zero().dot(u);
            let best = samples
                .iter()
                .enumerate()
                .max_by(|(_, p), (_, q)| alignment(p).total_cmp(&alignment(q)))
                .map(|(i, _)| i)
                .unwrap_or(0);
            samples.rotate_left(best);
            samples
        }
        (_, None) => b.sample(count),
    };

    if a.normal().dot(normal) < 0.0 && to.len() > 1 {
        to[1..].reverse();
    }
    (from, to)
}

/// Number of chords approximating a circle of `radius` within `tolerance` sagitta
pub fn circle_segments(radius: f64, tolerance: f64) -> usize {
    const MIN_SEGMENTS: usize = 8;
    const MAX_SEGMENTS: usize = 256;

    if radius <= 0.0 || tolerance <= 0.0 || tolerance >= radius {
        return MIN_SEGMENTS;
    }
    let half_angle = (1.0 - tolerance / radius).acos();
    let segments = (std::f64::consts::PI / half_angle).ceil() as usize;
    segments.clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Corners of the planar quad used by `make_planar_quad`
///
/// The quad lies in the plane spanned by `e1 = normalize(tangent)` and
/// `e2 = normalize(e1 × normal)`; corners are returned in the order
/// (−e1 −e2), (−e1 +e2), (+e1 +e2), (+e1 −e2).
pub fn planar_quad_corners(
    normal: DVec3,
    center: DVec3,
    tangent: DVec3,
    half_extent: f64,
) -> CadResult<[DVec3; 4]> {
    if half_extent <= 0.0 {
        return Err(CadError::InvalidProfile(format!(
            "Quad half extent must be positive, got {}",
            half_extent
        )));
    }
    let e1 = tangent.try_normalize().ok_or_else(|| {
        CadError::InvalidProfile("Quad tangent must not be the zero vector".into())
    })?;
    let e2 = e1.cross(normal).try_normalize().ok_or_else(|| {
        CadError::InvalidProfile("Quad tangent must not be parallel to the plane normal".into())
    })?;
    let d1 = e1 * half_extent;
    let d2 = e2 * half_extent;
    Ok([
        center - d1 - d2,
        center - d1 + d2,
        center + d1 + d2,
        center + d1 - d2,
    ])
}

/// Error type for geometry kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Shape not found: {0}")]
    ShapeNotFound(Uuid),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for kernel operations
pub type CadResult<T> = Result<T, CadError>;

/// A tessellated mesh output from the geometry kernel
#[derive(Debug, Clone, Default)]
pub struct TessellatedMesh {
    /// Vertex positions (3 floats per vertex)
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals (3 floats per vertex)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    /// Create an empty tessellated mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a vertex and return its index
    pub fn push_vertex(&mut self, position: DVec3, normal: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices
            .push([position.x as f32, position.y as f32, position.z as f32]);
        self.normals
            .push([normal.x as f32, normal.y as f32, normal.z as f32]);
        index
    }

    /// Append a triangle by vertex indices
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append all triangles of another mesh
    pub fn append(&mut self, other: TessellatedMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.normals.extend(other.normals);
        self.indices
            .extend(other.indices.into_iter().map(|i| i + offset));
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (fuse)
    Union,
    /// Intersection (common)
    Intersect,
}

/// The geometry kernel trait
///
/// Implementations provide exact shape construction using different backends
/// (the expression-tree CSG kernel, Truck, ...). Callers treat every method as a
/// blocking, side-effect-free construction returning a new handle.
pub trait GeometryKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Create a square planar face
    ///
    /// # Arguments
    /// * `normal` - Unit normal of the supporting plane
    /// * `center` - Center of the quad
    /// * `tangent` - First in-plane axis (need not be normalized)
    /// * `half_extent` - Half side length along both axes
    fn make_planar_quad(
        &self,
        normal: DVec3,
        center: DVec3,
        tangent: DVec3,
        half_extent: f64,
    ) -> CadResult<Shape>;

    /// Create a disc bounded by a circle
    fn make_circular_face(&self, radius: f64, center: DVec3, normal: DVec3) -> CadResult<Shape>;

    /// Create a solid cylinder starting at `base` and extending `height` along `axis`
    fn make_cylinder(&self, radius: f64, height: f64, base: DVec3, axis: DVec3)
    -> CadResult<Shape>;

    /// Extract the outer boundary wire of a face
    fn outer_wire(&self, face: &Shape) -> CadResult<Wire3D>;

    /// Ruled solid between two closed wires
    fn loft_wires(&self, a: &Wire3D, b: &Wire3D) -> CadResult<Shape>;

    /// Perform a boolean operation on two shapes
    fn boolean(&self, a: &Shape, b: &Shape, op: BooleanType) -> CadResult<Shape>;

    /// Package shapes into a compound without merging them
    fn make_compound(&self, shapes: &[Shape]) -> CadResult<Shape>;

    /// Tessellate a shape into triangles
    ///
    /// # Arguments
    /// * `shape` - The shape to tessellate
    /// * `tolerance` - The chordal tolerance (lower = more triangles)
    fn tessellate(&self, shape: &Shape, tolerance: f64) -> CadResult<TessellatedMesh>;

    /// Serialize a shape to the kernel's exchange format
    fn export_exchange(&self, shape: &Shape, path: &Path) -> CadResult<()>;

    /// Ruled solid between the outer boundaries of two faces
    fn loft(&self, a: &Shape, b: &Shape) -> CadResult<Shape> {
        let wire_a = self.outer_wire(a)?;
        let wire_b = self.outer_wire(b)?;
        self.loft_wires(&wire_a, &wire_b)
    }

    /// Union (fuse) of two shapes
    fn union(&self, a: &Shape, b: &Shape) -> CadResult<Shape> {
        self.boolean(a, b, BooleanType::Union)
    }

    /// Intersection (common) of two shapes
    fn intersection(&self, a: &Shape, b: &Shape) -> CadResult<Shape> {
        self.boolean(a, b, BooleanType::Intersect)
    }
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelNotAvailable(
            "No geometry kernel available".into(),
        ))
    }
}

impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn make_planar_quad(
        &self,
        _normal: DVec3,
        _center: DVec3,
        _tangent: DVec3,
        _half_extent: f64,
    ) -> CadResult<Shape> {
        Self::unavailable()
    }

    fn make_circular_face(
        &self,
        _radius: f64,
        _center: DVec3,
        _normal: DVec3,
    ) -> CadResult<Shape> {
        Self::unavailable()
    }

    fn make_cylinder(
        &self,
        _radius: f64,
        _height: f64,
        _base: DVec3,
        _axis: DVec3,
    ) -> CadResult<Shape> {
        Self::unavailable()
    }

    fn outer_wire(&self, _face: &Shape) -> CadResult<Wire3D> {
        Self::unavailable()
    }

    fn loft_wires(&self, _a: &Wire3D, _b: &Wire3D) -> CadResult<Shape> {
        Self::unavailable()
    }

    fn boolean(&self, _a: &Shape, _b: &Shape, _op: BooleanType) -> CadResult<Shape> {
        Self::unavailable()
    }

    fn make_compound(&self, _shapes: &[Shape]) -> CadResult<Shape> {
        Self::unavailable()
    }

    fn tessellate(&self, _shape: &Shape, _tolerance: f64) -> CadResult<TessellatedMesh> {
        Self::unavailable()
    }

    fn export_exchange(&self, _shape: &Shape, _path: &Path) -> CadResult<()> {
        Err(CadError::KernelNotAvailable(
            "No geometry kernel available for export".into(),
        ))
    }
}

/// Get the default geometry kernel based on available features
pub fn default_kernel() -> Box<dyn GeometryKernel> {
    #[cfg(feature = "truck")]
    {
        Box::new(super::TruckKernel::new())
    }

    #[cfg(not(feature = "truck"))]
    {
        Box::new(super::CsgKernel::new())
    }
}

/// Look up a kernel backend by name
pub fn kernel_by_name(name: &str) -> Option<Box<dyn GeometryKernel>> {
    match name {
        "csg" => Some(Box::new(super::CsgKernel::new())),
        #[cfg(feature = "truck")]
        "truck" => Some(Box::new(super::TruckKernel::new())),
        "null" => Some(Box::new(NullKernel)),
        _ => None,
    }
}
