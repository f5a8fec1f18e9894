//! Truck CAD Kernel Backend
//!
//! Pure Rust B-Rep kernel using the Truck library.
//!
//! Solid booleans go through truck-shapeops. Faces keep the wire they were
//! built from so that coplanar face intersections can be evaluated by
//! clipping boundaries and re-attaching a plane.

use std::collections::HashMap;
use std::path::Path;

use glam::DVec3;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use truck_meshalgo::prelude::*;
use truck_modeling::{
    Curve, Face, Point3, Rad, Shell, Solid as TruckSolid, Surface, Vector3, Vertex, Wire, builder,
};
use truck_topology::compress::{CompressedShell, CompressedSolid};

use super::polygon;
use super::{
    BooleanType, CadError, CadResult, GeometryKernel, Shape, ShapeKind, TessellatedMesh, Wire3D,
    planar_quad_corners, sample_matched,
};

/// A stored Truck entity
#[derive(Clone)]
enum TruckShape {
    /// One or more faces; `boundary` is set for a single face built by this kernel
    Faces {
        faces: Vec<Face>,
        boundary: Option<Wire3D>,
    },
    Solid(TruckSolid),
    Compound(Vec<TruckShape>),
}

impl TruckShape {
    fn kind(&self) -> ShapeKind {
        match self {
            TruckShape::Faces { .. } => ShapeKind::Face,
            TruckShape::Solid(_) => ShapeKind::Solid,
            TruckShape::Compound(_) => ShapeKind::Compound,
        }
    }
}

#[derive(Serialize)]
enum CompressedShape {
    Shell(CompressedShell<Point3, Curve, Surface>),
    Solid(CompressedSolid<Point3, Curve, Surface>),
    Compound(Vec<CompressedShape>),
}

fn compress(shape: &TruckShape) -> CompressedShape {
    match shape {
        TruckShape::Faces { faces, .. } => {
            CompressedShape::Shell(faces.iter().cloned().collect::<Shell>().compress())
        }
        TruckShape::Solid(solid) => CompressedShape::Solid(solid.compress()),
        TruckShape::Compound(children) => {
            CompressedShape::Compound(children.iter().map(compress).collect())
        }
    }
}

fn point(p: DVec3) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

fn vector(v: DVec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// Closed polygonal wire through `points`
fn polygon_wire(points: &[DVec3]) -> Wire {
    let vertices: Vec<Vertex> = points.iter().map(|p| builder::vertex(point(*p))).collect();
    let n = vertices.len();
    (0..n)
        .map(|i| builder::line(&vertices[i], &vertices[(i + 1) % n]))
        .collect::<Vec<_>>()
        .into()
}

/// Closed circular wire
fn circle_wire(center: DVec3, normal: DVec3, radius: f64) -> Wire {
    let (u, _) = crate::math::plane_basis(normal);
    let start = builder::vertex(point(center + u * radius));
    builder::rsweep(
        &start,
        point(center),
        vector(normal),
        Rad(std::f64::consts::TAU),
    )
}

fn plane_face(wire: Wire) -> CadResult<Face> {
    builder::try_attach_plane(&[wire])
        .map_err(|e| CadError::OperationFailed(format!("Failed to create face: {:?}", e)))
}

/// Truck-based geometry kernel
pub struct TruckKernel {
    /// Storage for shape data (keyed by UUID)
    shapes: Mutex<HashMap<Uuid, TruckShape>>,
}

impl TruckKernel {
    /// Create a new Truck kernel
    pub fn new() -> Self {
        Self {
            shapes: Mutex::new(HashMap::new()),
        }
    }

    fn store(&self, entity: TruckShape) -> Shape {
        let shape = Shape::new(entity.kind());
        self.shapes.lock().insert(shape.id, entity);
        shape
    }

    fn get(&self, shape: &Shape) -> CadResult<TruckShape> {
        self.shapes
            .lock()
            .get(&shape.id)
            .cloned()
            .ok_or(CadError::ShapeNotFound(shape.id))
    }

    fn store_face(&self, face: Face, boundary: Wire3D) -> Shape {
        self.store(TruckShape::Faces {
            faces: vec![face],
            boundary: Some(boundary),
        })
    }

    /// Intersection of two single planar faces with known convex boundaries
    fn intersect_faces(&self, a: &TruckShape, b: &TruckShape) -> CadResult<Shape> {
        let outline = |shape: &TruckShape| match shape {
            TruckShape::Faces {
                boundary: Some(wire),
                ..
            } => Some(wire.sample(wire.sample_count(crate::math::ARITHMETIC_TOLERANCE))),
            _ => None,
        };
        let (Some(a), Some(b)) = (outline(a), outline(b)) else {
            return Err(CadError::BooleanFailed(
                "Face intersection needs two single planar faces".into(),
            ));
        };
        if !polygon::are_coplanar(&a, &b, crate::math::ARITHMETIC_TOLERANCE) {
            return Err(CadError::BooleanFailed(
                "Face intersection needs coplanar faces".into(),
            ));
        }
        let clipped = polygon::clip_convex(&a, &b, 1e-12);
        if clipped.len() < 3 {
            return Ok(self.store(TruckShape::Faces {
                faces: Vec::new(),
                boundary: None,
            }));
        }
        let face = plane_face(polygon_wire(&clipped))?;
        Ok(self.store_face(face, Wire3D::Polygon(clipped)))
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryKernel for TruckKernel {
    fn name(&self) -> &str {
        "truck"
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
        let corners = planar_quad_corners(normal, center, tangent, half_extent)?;
        let face = plane_face(polygon_wire(&corners))?;
        Ok(self.store_face(face, Wire3D::Polygon(corners.to_vec())))
    }

    fn make_circular_face(&self, radius: f64, center: DVec3, normal: DVec3) -> CadResult<Shape> {
        let normal = normal
            .try_normalize()
            .filter(|_| radius > 0.0)
            .ok_or_else(|| CadError::InvalidProfile("Degenerate circle".into()))?;
        let face = plane_face(circle_wire(center, normal, radius))?;
        Ok(self.store_face(
            face,
            Wire3D::Circle {
                center,
                normal,
                radius,
            },
        ))
    }

    fn make_cylinder(
        &self,
        radius: f64,
        height: f64,
        base: DVec3,
        axis: DVec3,
    ) -> CadResult<Shape> {
        let axis = axis
            .try_normalize()
            .filter(|_| radius > 0.0 && height > 0.0)
            .ok_or_else(|| CadError::InvalidProfile("Degenerate cylinder".into()))?;
        let face = plane_face(circle_wire(base, axis, radius))?;
        let solid = builder::tsweep(&face, vector(axis * height));
        Ok(self.store(TruckShape::Solid(solid)))
    }

    fn outer_wire(&self, face: &Shape) -> CadResult<Wire3D> {
        match self.get(face)? {
            TruckShape::Faces {
                boundary: Some(wire),
                ..
            } => Ok(wire),
            _ => Err(CadError::OperationFailed(
                "Shape has no single outer wire".into(),
            )),
        }
    }

    fn loft_wires(&self, a: &Wire3D, b: &Wire3D) -> CadResult<Shape> {
        let tolerance = crate::math::ARITHMETIC_TOLERANCE;
        let count = a.sample_count(tolerance).max(b.sample_count(tolerance));
        let (from, to) = sample_matched(a, b, count);
        let wire_a = polygon_wire(&from);
        let wire_b = polygon_wire(&to);

        let mut shell = builder::try_wire_homotopy(&wire_a, &wire_b)
            .map_err(|e| CadError::OperationFailed(format!("Loft failed: {:?}", e)))?;
        shell.push(plane_face(wire_a.inverse())?);
        shell.push(plane_face(wire_b)?);
        let solid = TruckSolid::try_new(vec![shell])
            .map_err(|e| CadError::OperationFailed(format!("Loft is not closed: {:?}", e)))?;
        Ok(self.store(TruckShape::Solid(solid)))
    }

    fn boolean(&self, a: &Shape, b: &Shape, op: BooleanType) -> CadResult<Shape> {
        let left = self.get(a)?;
        let right = self.get(b)?;
        let tolerance = crate::math::ARITHMETIC_TOLERANCE;

        match (op, left, right) {
            (BooleanType::Union, TruckShape::Solid(x), TruckShape::Solid(y)) => {
                let fused = truck_shapeops::or(&x, &y, tolerance).ok_or_else(|| {
                    CadError::BooleanFailed("Truck union of solids failed".into())
                })?;
                Ok(self.store(TruckShape::Solid(fused)))
            }
            (BooleanType::Intersect, TruckShape::Solid(x), TruckShape::Solid(y)) => {
                let common = truck_shapeops::and(&x, &y, tolerance).ok_or_else(|| {
                    CadError::BooleanFailed("Truck intersection of solids failed".into())
                })?;
                Ok(self.store(TruckShape::Solid(common)))
            }
            (
                BooleanType::Union,
                TruckShape::Faces { faces: mut x, .. },
                TruckShape::Faces { faces: y, .. },
            ) => {
                x.extend(y);
                Ok(self.store(TruckShape::Faces {
                    faces: x,
                    boundary: None,
                }))
            }
            (BooleanType::Union, x, y) => Ok(self.store(TruckShape::Compound(vec![x, y]))),
            (BooleanType::Intersect, x, y) => self.intersect_faces(&x, &y),
        }
    }

    fn make_compound(&self, shapes: &[Shape]) -> CadResult<Shape> {
        if shapes.is_empty() {
            return Err(CadError::OperationFailed(
                "Compound requires at least one shape".into(),
            ));
        }
        let children = shapes
            .iter()
            .map(|s| self.get(s))
            .collect::<CadResult<Vec<_>>>()?;
        Ok(self.store(TruckShape::Compound(children)))
    }

    fn tessellate(&self, shape: &Shape, tolerance: f64) -> CadResult<TessellatedMesh> {
        fn collect(shape: &TruckShape, tolerance: f64, mesh: &mut TessellatedMesh) {
            let polygon = match shape {
                TruckShape::Faces { faces, .. } => faces
                    .iter()
                    .cloned()
                    .collect::<Shell>()
                    .triangulation(tolerance)
                    .to_polygon(),
                TruckShape::Solid(solid) => solid.triangulation(tolerance).to_polygon(),
                TruckShape::Compound(children) => {
                    for child in children {
                        collect(child, tolerance, mesh);
                    }
                    return;
                }
            };
            let positions = polygon.positions();
            let normals = polygon.normals();
            for triangle in polygon.faces().triangle_iter() {
                let indices = triangle.map(|v| {
                    let p = positions[v.pos];
                    let n = v
                        .nor
                        .and_then(|i| normals.get(i))
                        .map(|n| DVec3::new(n.x, n.y, n.z))
                        .unwrap_or(DVec3::ZERO);
                    mesh.push_vertex(DVec3::new(p.x, p.y, p.z), n)
                });
                mesh.push_triangle(indices[0], indices[1], indices[2]);
            }
        }

        let entity = self.get(shape)?;
        let mut mesh = TessellatedMesh::new();
        collect(&entity, tolerance.max(1e-6), &mut mesh);
        if mesh.is_empty() && shape.kind == ShapeKind::Solid {
            return Err(CadError::TessellationFailed(
                "Truck produced no triangles".into(),
            ));
        }
        tracing::debug!(
            "Tessellated shape {} into {} triangles",
            shape.id,
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    fn export_exchange(&self, shape: &Shape, path: &Path) -> CadResult<()> {
        let entity = self.get(shape)?;
        let json = serde_json::to_vec_pretty(&compress(&entity))
            .map_err(|e| CadError::Export(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| CadError::FileIo(e.to_string()))?;
        tracing::info!("Wrote exchange file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truck_cylinder_tessellates() {
        let kernel = TruckKernel::new();
        let cylinder = kernel
            .make_cylinder(1.0, 2.0, DVec3::ZERO, DVec3::Z)
            .unwrap();
        assert_eq!(cylinder.kind, ShapeKind::Solid);
        let mesh = kernel.tessellate(&cylinder, 0.05).unwrap();
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn test_truck_coplanar_face_intersection() {
        let kernel = TruckKernel::new();
        let a = kernel
            .make_planar_quad(DVec3::Z, DVec3::new(0.0, 1.0, 0.0), DVec3::X, 1.0)
            .unwrap();
        let b = kernel
            .make_planar_quad(DVec3::Z, DVec3::new(1.0, 0.0, 0.0), DVec3::Y, 1.0)
            .unwrap();
        let common = kernel.intersection(&a, &b).unwrap();
        let Wire3D::Polygon(points) = kernel.outer_wire(&common).unwrap() else {
            panic!("expected a polygon boundary");
        };
        assert!((polygon::area(&points) - 1.0).abs() < 1e-9);
    }
}
