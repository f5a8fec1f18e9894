//! Expression-tree CSG kernel
//!
//! Every construction is recorded as an exact analytic node (quads, discs,
//! cylinders, lofts and the booleans between them). Nothing is approximated
//! until a mesh is requested, so the trimming math sees exact shapes.
//!
//! Tessellation supports every node the trimming pipeline produces: unions
//! are emitted as the concatenation of their operands, and intersections are
//! evaluated when both operands are coplanar planar patches.

use std::collections::HashMap;
use std::path::Path;

use glam::DVec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::polygon;
use super::{
    BooleanType, CadError, CadResult, GeometryKernel, Shape, ShapeKind, TessellatedMesh, Wire3D,
    circle_segments, planar_quad_corners, sample_matched,
};
use crate::math::plane_basis;

/// Format tag written at the top of exchange files
pub const EXCHANGE_FORMAT: &str = "trim-csg";

/// Exchange file format version
pub const EXCHANGE_VERSION: u32 = 1;

/// Exact description of a shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeNode {
    /// Planar quad with corners in boundary order
    Quad { normal: DVec3, corners: [DVec3; 4] },
    /// Planar disc
    Disc {
        center: DVec3,
        normal: DVec3,
        radius: f64,
    },
    /// Solid cylinder from `base` along unit `axis`
    Cylinder {
        base: DVec3,
        axis: DVec3,
        radius: f64,
        height: f64,
    },
    /// Ruled solid between two closed wires
    Loft { from: Wire3D, to: Wire3D },
    Union(Box<ShapeNode>, Box<ShapeNode>),
    Intersection(Box<ShapeNode>, Box<ShapeNode>),
    /// Independent constituents, never merged
    Compound(Vec<ShapeNode>),
}

impl ShapeNode {
    /// Topological class of this node
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeNode::Quad { .. } | ShapeNode::Disc { .. } => ShapeKind::Face,
            ShapeNode::Cylinder { .. } | ShapeNode::Loft { .. } => ShapeKind::Solid,
            ShapeNode::Union(a, b) => a.kind().combine(b.kind()),
            ShapeNode::Intersection(a, b) => a.kind().min(b.kind()),
            ShapeNode::Compound(_) => ShapeKind::Compound,
        }
    }

    /// Number of direct constituents of a compound (1 for any other node)
    pub fn constituent_count(&self) -> usize {
        match self {
            ShapeNode::Compound(children) => children.len(),
            _ => 1,
        }
    }

    /// Outline of a planar patch as a convex polygon, if this node is one
    ///
    /// Circles are discretized at `tolerance`. Intersections of coplanar
    /// planar patches are evaluated by clipping; an empty overlap yields an
    /// empty outline.
    pub fn planar_outline(&self, tolerance: f64) -> Option<Vec<DVec3>> {
        match self {
            ShapeNode::Quad { corners, .. } => Some(corners.to_vec()),
            ShapeNode::Disc {
                center,
                normal,
                radius,
            } => {
                let wire = Wire3D::Circle {
                    center: *center,
                    normal: *normal,
                    radius: *radius,
                };
                Some(wire.sample(circle_segments(*radius, tolerance)))
            }
            ShapeNode::Intersection(a, b) => {
                let a = a.planar_outline(tolerance)?;
                let b = b.planar_outline(tolerance)?;
                if a.len() < 3 || b.len() < 3 {
                    return Some(Vec::new());
                }
                if !polygon::are_coplanar(&a, &b, coplanar_tolerance(tolerance)) {
                    return None;
                }
                Some(polygon::clip_convex(&a, &b, 1e-12))
            }
            _ => None,
        }
    }

    /// Append the triangles of this node to `mesh`
    pub fn tessellate_into(&self, tolerance: f64, mesh: &mut TessellatedMesh) -> CadResult<()> {
        match self {
            ShapeNode::Quad { normal, corners } => {
                fan(corners, *normal, mesh);
                Ok(())
            }
            ShapeNode::Disc { normal, .. } => {
                let outline = self.planar_outline(tolerance).unwrap_or_default();
                fan(&outline, *normal, mesh);
                Ok(())
            }
            ShapeNode::Cylinder {
                base,
                axis,
                radius,
                height,
            } => {
                tessellate_cylinder(*base, *axis, *radius, *height, tolerance, mesh);
                Ok(())
            }
            ShapeNode::Loft { from, to } => {
                tessellate_loft(from, to, tolerance, mesh);
                Ok(())
            }
            ShapeNode::Union(a, b) => {
                a.tessellate_into(tolerance, mesh)?;
                b.tessellate_into(tolerance, mesh)
            }
            ShapeNode::Intersection(..) => {
                let outline = self.planar_outline(tolerance).ok_or_else(|| {
                    CadError::TessellationFailed(
                        "Intersection is only evaluated between coplanar planar faces".into(),
                    )
                })?;
                if outline.len() >= 3 {
                    let normal = polygon::newell_normal(&outline).normalize_or_zero();
                    fan(&outline, normal, mesh);
                }
                Ok(())
            }
            ShapeNode::Compound(children) => {
                for child in children {
                    child.tessellate_into(tolerance, mesh)?;
                }
                Ok(())
            }
        }
    }
}

/// Coplanarity tolerance derived from the tessellation tolerance
fn coplanar_tolerance(tolerance: f64) -> f64 {
    tolerance.max(1e-9)
}

/// Triangle fan over a convex outline
fn fan(outline: &[DVec3], normal: DVec3, mesh: &mut TessellatedMesh) {
    if outline.len() < 3 {
        return;
    }
    let first = mesh.push_vertex(outline[0], normal);
    let mut previous = mesh.push_vertex(outline[1], normal);
    for point in &outline[2..] {
        let current = mesh.push_vertex(*point, normal);
        mesh.push_triangle(first, previous, current);
        previous = current;
    }
}

/// Cylinder side and caps, following the axis from `base`
fn tessellate_cylinder(
    base: DVec3,
    axis: DVec3,
    radius: f64,
    height: f64,
    tolerance: f64,
    mesh: &mut TessellatedMesh,
) {
    let segments = circle_segments(radius, tolerance);
    let (u, v) = plane_basis(axis);
    let top = base + axis * height;

    // Side vertices
    let side_start = mesh.vertices.len() as u32;
    for i in 0..=segments {
        let theta = (i as f64 / segments as f64) * std::f64::consts::TAU;
        let radial = u * theta.cos() + v * theta.sin();
        mesh.push_vertex(base + radial * radius, radial);
        mesh.push_vertex(top + radial * radius, radial);
    }

    // Side triangles
    for i in 0..segments as u32 {
        let b = side_start + i * 2;
        mesh.push_triangle(b, b + 2, b + 1);
        mesh.push_triangle(b + 1, b + 2, b + 3);
    }

    // Caps
    let rim = |center: DVec3| -> Vec<DVec3> {
        Wire3D::Circle {
            center,
            normal: axis,
            radius,
        }
        .sample(segments)
    };
    fan(&rim(top), axis, mesh);
    let mut bottom = rim(base);
    bottom.reverse();
    fan(&bottom, -axis, mesh);
}

/// Ruled strip between two wires plus planar caps
fn tessellate_loft(from: &Wire3D, to: &Wire3D, tolerance: f64, mesh: &mut TessellatedMesh) {
    let count = from
        .sample_count(tolerance)
        .max(to.sample_count(tolerance));
    let (a, b) = sample_matched(from, to, count);
    if a.len() < 3 || b.len() < 3 {
        return;
    }

    let start = mesh.vertices.len() as u32;
    for i in 0..count {
        let next = (i + 1) % count;
        let along = a[next] - a[i];
        let across = b[i] - a[i];
        let normal = along.cross(across).normalize_or_zero();
        mesh.push_vertex(a[i], normal);
        mesh.push_vertex(b[i], normal);
    }
    for i in 0..count as u32 {
        let next = (i + 1) % count as u32;
        let (a0, b0) = (start + i * 2, start + i * 2 + 1);
        let (a1, b1) = (start + next * 2, start + next * 2 + 1);
        mesh.push_triangle(a0, a1, b0);
        mesh.push_triangle(b0, a1, b1);
    }

    fan(&a, polygon::newell_normal(&a).normalize_or_zero(), mesh);
    fan(&b, polygon::newell_normal(&b).normalize_or_zero(), mesh);
}

/// Serialized exchange document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeDocument {
    pub format: String,
    pub version: u32,
    pub root: ShapeNode,
}

/// Expression-tree CSG kernel
pub struct CsgKernel {
    /// Storage for shape data (keyed by UUID)
    shapes: Mutex<HashMap<Uuid, ShapeNode>>,
}

impl CsgKernel {
    /// Create a new CSG kernel
    pub fn new() -> Self {
        Self {
            shapes: Mutex::new(HashMap::new()),
        }
    }

    /// Store a node and return a handle to it
    fn store(&self, node: ShapeNode) -> Shape {
        let shape = Shape::new(node.kind());
        tracing::trace!("Stored {:?} shape {}", shape.kind, shape.id);
        self.shapes.lock().insert(shape.id, node);
        shape
    }

    /// Get a copy of the stored node behind a handle
    pub fn node(&self, shape: &Shape) -> CadResult<ShapeNode> {
        self.shapes
            .lock()
            .get(&shape.id)
            .cloned()
            .ok_or(CadError::ShapeNotFound(shape.id))
    }

    /// Number of shapes currently stored
    pub fn shape_count(&self) -> usize {
        self.shapes.lock().len()
    }

    /// Read an exchange file written by `export_exchange`
    pub fn read_exchange(path: &Path) -> CadResult<ExchangeDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| CadError::FileIo(e.to_string()))?;
        let document: ExchangeDocument =
            ron::from_str(&content).map_err(|e| CadError::FileIo(e.to_string()))?;
        if document.format != EXCHANGE_FORMAT {
            return Err(CadError::FileIo(format!(
                "Unexpected exchange format '{}'",
                document.format
            )));
        }
        Ok(document)
    }
}

impl Default for CsgKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryKernel for CsgKernel {
    fn name(&self) -> &str {
        "csg"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn make_planar_quad(
        &self,
        normal: DVec3,
        center: DVec3,
        tangent: DVec3,
        half_extent: f64,
    ) -> CadResult<Shape> {
        let normal = normal
            .try_normalize()
            .ok_or_else(|| CadError::InvalidProfile("Quad normal must not be zero".into()))?;
        let corners = planar_quad_corners(normal, center, tangent, half_extent)?;
        Ok(self.store(ShapeNode::Quad { normal, corners }))
    }

    fn make_circular_face(&self, radius: f64, center: DVec3, normal: DVec3) -> CadResult<Shape> {
        if radius <= 0.0 {
            return Err(CadError::InvalidProfile(format!(
                "Circle radius must be positive, got {}",
                radius
            )));
        }
        let normal = normal
            .try_normalize()
            .ok_or_else(|| CadError::InvalidProfile("Circle normal must not be zero".into()))?;
        Ok(self.store(ShapeNode::Disc {
            center,
            normal,
            radius,
        }))
    }

    fn make_cylinder(
        &self,
        radius: f64,
        height: f64,
        base: DVec3,
        axis: DVec3,
    ) -> CadResult<Shape> {
        if radius <= 0.0 || height <= 0.0 {
            return Err(CadError::InvalidProfile(format!(
                "Cylinder needs positive radius and height, got r={} h={}",
                radius, height
            )));
        }
        let axis = axis
            .try_normalize()
            .ok_or_else(|| CadError::InvalidProfile("Cylinder axis must not be zero".into()))?;
        Ok(self.store(ShapeNode::Cylinder {
            base,
            axis,
            radius,
            height,
        }))
    }

    fn outer_wire(&self, face: &Shape) -> CadResult<Wire3D> {
        match self.node(face)? {
            ShapeNode::Quad { corners, .. } => Ok(Wire3D::Polygon(corners.to_vec())),
            ShapeNode::Disc {
                center,
                normal,
                radius,
            } => Ok(Wire3D::Circle {
                center,
                normal,
                radius,
            }),
            node @ ShapeNode::Intersection(..) => node
                .planar_outline(crate::math::ARITHMETIC_TOLERANCE)
                .filter(|outline| outline.len() >= 3)
                .map(Wire3D::Polygon)
                .ok_or_else(|| {
                    CadError::OperationFailed("Intersection has no planar outer boundary".into())
                }),
            other => Err(CadError::OperationFailed(format!(
                "Shape of kind {:?} has no single outer wire",
                other.kind()
            ))),
        }
    }

    fn loft_wires(&self, a: &Wire3D, b: &Wire3D) -> CadResult<Shape> {
        for wire in [a, b] {
            let valid = match wire {
                Wire3D::Polygon(points) => points.len() >= 3,
                Wire3D::Circle { radius, .. } => *radius > 0.0,
            };
            if !valid {
                return Err(CadError::InvalidProfile(
                    "Loft profiles must be closed, non-degenerate wires".into(),
                ));
            }
        }
        Ok(self.store(ShapeNode::Loft {
            from: a.clone(),
            to: b.clone(),
        }))
    }

    fn boolean(&self, a: &Shape, b: &Shape, op: BooleanType) -> CadResult<Shape> {
        let left = Box::new(self.node(a)?);
        let right = Box::new(self.node(b)?);
        let node = match op {
            BooleanType::Union => ShapeNode::Union(left, right),
            BooleanType::Intersect => ShapeNode::Intersection(left, right),
        };
        Ok(self.store(node))
    }

    fn make_compound(&self, shapes: &[Shape]) -> CadResult<Shape> {
        if shapes.is_empty() {
            return Err(CadError::OperationFailed(
                "Compound requires at least one shape".into(),
            ));
        }
        let children = shapes
            .iter()
            .map(|s| self.node(s))
            .collect::<CadResult<Vec<_>>>()?;
        Ok(self.store(ShapeNode::Compound(children)))
    }

    fn tessellate(&self, shape: &Shape, tolerance: f64) -> CadResult<TessellatedMesh> {
        if tolerance <= 0.0 {
            return Err(CadError::TessellationFailed(format!(
                "Tolerance must be positive, got {}",
                tolerance
            )));
        }
        let node = self.node(shape)?;
        let mut mesh = TessellatedMesh::new();
        node.tessellate_into(tolerance, &mut mesh)?;
        tracing::debug!(
            "Tessellated shape {} into {} triangles",
            shape.id,
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    fn export_exchange(&self, shape: &Shape, path: &Path) -> CadResult<()> {
        let document = ExchangeDocument {
            format: EXCHANGE_FORMAT.to_string(),
            version: EXCHANGE_VERSION,
            root: self.node(shape)?,
        };
        let content = ron::ser::to_string_pretty(&document, ron::ser::PrettyConfig::default())
            .map_err(|e| CadError::Export(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| CadError::FileIo(e.to_string()))?;
        tracing::info!("Wrote exchange file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quad_node_is_exact() {
        let kernel = CsgKernel::new();
        let quad = kernel
            .make_planar_quad(DVec3::Z, DVec3::ZERO, DVec3::new(2.0, 2.0, 0.0), 2f64.sqrt())
            .unwrap();
        assert!(quad.is_face());
        let ShapeNode::Quad { corners, .. } = kernel.node(&quad).unwrap() else {
            panic!("expected a quad node");
        };
        let center = corners.iter().copied().sum::<DVec3>() / 4.0;
        assert_abs_diff_eq!(center.length(), 0.0, epsilon = 1e-12);
        // Half extent √2 along the diagonal gives corners at distance 2 from the center
        for c in corners {
            assert_abs_diff_eq!(c.length(), 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let kernel = CsgKernel::new();
        assert!(kernel.make_circular_face(0.0, DVec3::ZERO, DVec3::Z).is_err());
        assert!(kernel.make_cylinder(1.0, 0.0, DVec3::ZERO, DVec3::Z).is_err());
        assert!(kernel.make_cylinder(1.0, 1.0, DVec3::ZERO, DVec3::ZERO).is_err());
        assert_eq!(kernel.shape_count(), 0);
    }

    #[test]
    fn test_quad_tessellation() {
        let kernel = CsgKernel::new();
        let quad = kernel
            .make_planar_quad(DVec3::Z, DVec3::ZERO, DVec3::X, 1.0)
            .unwrap();
        let mesh = kernel.tessellate(&quad, 0.01).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
    }

    #[test]
    fn test_cylinder_tessellation_stays_on_surface() {
        let kernel = CsgKernel::new();
        let cylinder = kernel
            .make_cylinder(0.5, 2.0, DVec3::ZERO, DVec3::Z)
            .unwrap();
        assert_eq!(cylinder.kind, ShapeKind::Solid);
        let mesh = kernel.tessellate(&cylinder, 0.01).unwrap();
        assert!(mesh.triangle_count() > 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            let radial = (v[0] as f64).hypot(v[1] as f64);
            assert!(radial <= 0.5 + 1e-6);
            assert!(v[2] >= -1e-6 && v[2] <= 2.0 + 1e-6);
        }
    }

    #[test]
    fn test_coplanar_intersection_is_clipped() {
        let kernel = CsgKernel::new();
        let a = kernel
            .make_planar_quad(DVec3::Z, DVec3::new(0.0, 1.0, 0.0), DVec3::X, 1.0)
            .unwrap();
        let b = kernel
            .make_planar_quad(DVec3::Z, DVec3::new(1.0, 0.0, 0.0), DVec3::Y, 1.0)
            .unwrap();
        let common = kernel.intersection(&a, &b).unwrap();
        let outline = kernel
            .node(&common)
            .unwrap()
            .planar_outline(0.001)
            .unwrap();
        assert_abs_diff_eq!(polygon::area(&outline), 1.0, epsilon = 1e-9);

        let mesh = kernel.tessellate(&common, 0.001).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(matches!(kernel.outer_wire(&common), Ok(Wire3D::Polygon(_))));
    }

    #[test]
    fn test_non_coplanar_intersection_fails_to_tessellate() {
        let kernel = CsgKernel::new();
        let a = kernel
            .make_planar_quad(DVec3::Z, DVec3::ZERO, DVec3::X, 1.0)
            .unwrap();
        let b = kernel
            .make_planar_quad(DVec3::X, DVec3::ZERO, DVec3::Y, 1.0)
            .unwrap();
        let common = kernel.intersection(&a, &b).unwrap();
        assert!(matches!(
            kernel.tessellate(&common, 0.01),
            Err(CadError::TessellationFailed(_))
        ));
    }

    #[test]
    fn test_loft_between_faces() {
        let kernel = CsgKernel::new();
        let a = kernel
            .make_circular_face(1.0, DVec3::ZERO, DVec3::Z)
            .unwrap();
        let b = kernel
            .make_circular_face(1.0, DVec3::new(0.0, 0.0, 3.0), DVec3::new(0.0, 0.6, 0.8))
            .unwrap();
        let loft = kernel.loft(&a, &b).unwrap();
        assert_eq!(loft.kind, ShapeKind::Solid);
        assert!(matches!(kernel.node(&loft).unwrap(), ShapeNode::Loft { .. }));

        let mesh = kernel.tessellate(&loft, 0.01).unwrap();
        assert!(mesh.triangle_count() > 0);
        // The side strip comes first, one (bottom, top) vertex pair per ruling
        let rulings = circle_segments(1.0, 0.01);
        for pair in mesh.vertices[..rulings * 2].chunks(2) {
            let [x0, y0, _] = pair[0];
            let [x1, y1, _] = pair[1];
            let mid = glam::Vec2::new(x0 + x1, y0 + y1) * 0.5;
            assert!(mid.length() > 0.85, "ruling cuts inside the wall: {}", mid.length());
        }
    }

    #[test]
    fn test_compound_keeps_constituents() {
        let kernel = CsgKernel::new();
        let a = kernel
            .make_cylinder(1.0, 1.0, DVec3::ZERO, DVec3::Z)
            .unwrap();
        let b = kernel
            .make_cylinder(1.0, 1.0, DVec3::X * 5.0, DVec3::Z)
            .unwrap();
        let compound = kernel.make_compound(&[a, b]).unwrap();
        assert_eq!(compound.kind, ShapeKind::Compound);
        assert_eq!(kernel.node(&compound).unwrap().constituent_count(), 2);
        assert!(kernel.make_compound(&[]).is_err());
    }

    #[test]
    fn test_exchange_roundtrip() {
        let kernel = CsgKernel::new();
        let disc = kernel
            .make_circular_face(0.25, DVec3::new(0.0, 0.0, 1.0), DVec3::Z)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disc.ron");
        kernel.export_exchange(&disc, &path).unwrap();

        let document = CsgKernel::read_exchange(&path).unwrap();
        assert_eq!(document.version, EXCHANGE_VERSION);
        assert_eq!(document.root, kernel.node(&disc).unwrap());
    }
}
