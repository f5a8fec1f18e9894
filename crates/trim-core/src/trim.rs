//! Trimming engine
//!
//! Turns a classified curve into the surface patch(es) it implies. Dispatch
//! is on the multiset of matched primitive kinds:
//!
//! | matched                  | result                                   |
//! |--------------------------|------------------------------------------|
//! | plane                    | planar face                              |
//! | plane + cylinder         | capped cylinder or oblique loft          |
//! | plane + plane            | one planar face per plane, left unmerged |
//! | 2 cylinders + plane      | plane + second cylinder, axes parallel   |

use glam::DVec3;
use trim_cad::math::are_parallel;
use trim_cad::{GeometryKernel, Shape};

use crate::classify::{ClassifiedCurve, classify};
use crate::config::TrimConfig;
use crate::curve::{Curve, CurveEnds, endpoint_positions, fit_circle};
use crate::error::TrimError;
use crate::primitive::{Cylinder, Plane, Primitive, Surface, lookup};

/// A planar face produced for one plane of a plane+plane curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPatch {
    pub face: Shape,
    /// Normal of the supporting plane
    pub normal: DVec3,
    /// Center of the curve the face was built from
    pub center: DVec3,
    /// Supporting plane primitive id
    pub primitive: usize,
}

/// Result of trimming one curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimmedPatch {
    /// A face or solid ready for assembly
    Single(Shape),
    /// Two planar faces awaiting coplanar grouping
    PlanePair([PlanarPatch; 2]),
}

impl TrimmedPatch {
    pub fn planar_patches(&self) -> &[PlanarPatch] {
        match self {
            TrimmedPatch::Single(_) => &[],
            TrimmedPatch::PlanePair(pair) => pair,
        }
    }
}

/// Classifies and trims curves against one primitive list
pub struct Trimmer<'a> {
    kernel: &'a dyn GeometryKernel,
    primitives: &'a [Primitive],
    config: &'a TrimConfig,
}

impl<'a> Trimmer<'a> {
    pub fn new(
        kernel: &'a dyn GeometryKernel,
        primitives: &'a [Primitive],
        config: &'a TrimConfig,
    ) -> Self {
        Self {
            kernel,
            primitives,
            config,
        }
    }

    pub fn kernel(&self) -> &'a dyn GeometryKernel {
        self.kernel
    }

    /// Classify a raw curve, then trim it
    pub fn trim_curve(&self, curve: &Curve) -> Result<TrimmedPatch, TrimError> {
        let classified = classify(curve, self.primitives, self.config)?;
        self.trim(&classified)
    }

    /// Trim a classified curve
    pub fn trim(&self, classified: &ClassifiedCurve) -> Result<TrimmedPatch, TrimError> {
        let curve = classified.index();
        let mut ids = classified.primitives.clone();
        ids.sort_unstable();
        ids.dedup();

        let mut planes: Vec<(usize, &Plane)> = Vec::new();
        let mut cylinders: Vec<(usize, &Cylinder)> = Vec::new();
        for id in &ids {
            let primitive = lookup(self.primitives, curve, *id)?;
            match &primitive.surface {
                Surface::Plane(plane) => planes.push((primitive.id, plane)),
                Surface::Cylinder(cylinder) => cylinders.push((primitive.id, cylinder)),
            }
        }

        let unsupported = || TrimError::UnsupportedPrimitiveCombination {
            curve,
            primitives: ids.clone(),
        };

        match (planes.as_slice(), cylinders.as_slice()) {
            ([(_, plane)], []) => {
                let (face, _) = self.trim_plane(classified, plane)?;
                Ok(TrimmedPatch::Single(face))
            }
            ([(_, plane)], [(_, cylinder)]) => Ok(TrimmedPatch::Single(
                self.trim_cylinder(classified, cylinder, plane)?,
            )),
            ([(id_a, plane_a), (id_b, plane_b)], []) => {
                let (face_a, center_a) = self.trim_plane(classified, plane_a)?;
                let (face_b, center_b) = self.trim_plane(classified, plane_b)?;
                Ok(TrimmedPatch::PlanePair([
                    PlanarPatch {
                        face: face_a,
                        normal: plane_a.normal,
                        center: center_a,
                        primitive: *id_a,
                    },
                    PlanarPatch {
                        face: face_b,
                        normal: plane_b.normal,
                        center: center_b,
                        primitive: *id_b,
                    },
                ]))
            }
            ([(_, plane)], [(_, first), (_, second)]) => {
                if are_parallel(first.axis, second.axis, self.config.arithmetic_tolerance) {
                    Ok(TrimmedPatch::Single(
                        self.trim_cylinder(classified, second, plane)?,
                    ))
                } else {
                    tracing::warn!(
                        "Curve {}: cylinders {:?} are not parallel",
                        curve,
                        cylinders.iter().map(|(id, _)| *id).collect::<Vec<_>>()
                    );
                    Err(unsupported())
                }
            }
            _ => Err(unsupported()),
        }
    }

    /// Planar face bounded by a curve
    ///
    /// Closed curves give a disc through the fitted circle. Open curves give
    /// a square centered at the endpoint midpoint with one side along the
    /// endpoint chord. Returns the face and its center.
    pub fn trim_plane(
        &self,
        classified: &ClassifiedCurve,
        plane: &Plane,
    ) -> Result<(Shape, DVec3), TrimError> {
        let curve = &classified.curve;
        match classified.ends {
            CurveEnds::Closed => {
                let circle = fit_circle(curve)?;
                if self.config.trace_constructions {
                    tracing::debug!(
                        "Curve {}: disc r={} center={} normal={}",
                        curve.index,
                        circle.radius,
                        circle.center,
                        plane.normal
                    );
                }
                let face = self
                    .kernel
                    .make_circular_face(circle.radius, circle.center, plane.normal)?;
                Ok((face, circle.center))
            }
            CurveEnds::Open(ends) => {
                let (p1, p2) = endpoint_positions(curve, ends)?;
                let tangent = p1 - p2;
                let center = (p1 + p2) * 0.5;
                let half_extent = tangent.length() * 0.5;
                if self.config.trace_constructions {
                    tracing::debug!(
                        "Curve {}: quad center={} tangent={} half_extent={} normal={}",
                        curve.index,
                        center,
                        tangent,
                        half_extent,
                        plane.normal
                    );
                }
                let face = self
                    .kernel
                    .make_planar_quad(plane.normal, center, tangent, half_extent)?;
                Ok((face, center))
            }
        }
    }

    /// Cylinder patch cut by a plane
    ///
    /// When the axis is parallel to the plane normal the plane caps the
    /// cylinder and a solid cylinder runs from the base to the curve.
    /// Otherwise the cut is oblique and a loft joins the disc on the cutting
    /// plane to the disc at the cylinder base.
    pub fn trim_cylinder(
        &self,
        classified: &ClassifiedCurve,
        cylinder: &Cylinder,
        plane: &Plane,
    ) -> Result<Shape, TrimError> {
        let curve = &classified.curve;

        if are_parallel(cylinder.axis, plane.normal, self.config.arithmetic_tolerance) {
            let signed_height = (curve.first_point()? - cylinder.base).dot(cylinder.axis);
            let axis = if signed_height < 0.0 {
                -cylinder.axis
            } else {
                cylinder.axis
            };
            let height = signed_height.abs();
            if self.config.trace_constructions {
                tracing::debug!(
                    "Curve {}: cylinder r={} h={} base={} axis={}",
                    curve.index,
                    cylinder.radius,
                    height,
                    cylinder.base,
                    axis
                );
            }
            return Ok(self
                .kernel
                .make_cylinder(cylinder.radius, height, cylinder.base, axis)?);
        }

        let circle = fit_circle(curve)?;
        if self.config.trace_constructions {
            tracing::debug!(
                "Curve {}: loft r={} from center={} normal={} to base={} axis={}",
                curve.index,
                circle.radius,
                circle.center,
                plane.normal,
                cylinder.base,
                cylinder.axis
            );
        }
        let cut = self
            .kernel
            .make_circular_face(circle.radius, circle.center, plane.normal)?;
        let base = self
            .kernel
            .make_circular_face(circle.radius, cylinder.base, cylinder.axis)?;
        Ok(self.kernel.loft(&cut, &base)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use trim_cad::{CsgKernel, ShapeNode};

    fn classified(points: Vec<DVec3>, closed: bool, primitives: Vec<usize>) -> ClassifiedCurve {
        let n = points.len();
        let segment_count = if closed { n } else { n - 1 };
        let segments = (0..segment_count).map(|i| [i, (i + 1) % n]).collect();
        let ends = if closed {
            CurveEnds::Closed
        } else {
            CurveEnds::Open([0, n - 1])
        };
        ClassifiedCurve {
            curve: Curve::new(0, points, segments),
            ends,
            primitives,
        }
    }

    fn circle_points(center: DVec3, radius: f64) -> Vec<DVec3> {
        (0..32)
            .map(|i| {
                let angle = i as f64 / 32.0 * std::f64::consts::TAU;
                center + DVec3::new(angle.cos(), angle.sin(), 0.0) * radius
            })
            .collect()
    }

    #[test]
    fn test_trim_plane_open_curve_quad() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![Primitive::plane(0, DVec3::Z, 0.0, 0.001)];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let curve = classified(
            vec![DVec3::new(-1.0, -1.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
            false,
            vec![0],
        );
        let plane = Plane::new(DVec3::Z, 0.0);
        let (face, center) = trimmer.trim_plane(&curve, &plane).unwrap();
        assert_eq!(center, DVec3::ZERO);

        let ShapeNode::Quad { corners, normal } = kernel.node(&face).unwrap() else {
            panic!("expected a quad");
        };
        assert_eq!(normal, DVec3::Z);
        // Half extent √2 along (1,1) and its perpendicular
        for corner in corners {
            assert_abs_diff_eq!(corner.length(), 2.0, epsilon = 1e-12);
        }
        let side = (corners[1] - corners[0]).length();
        assert_abs_diff_eq!(side, 2.0 * 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_trim_plane_closed_curve_disc() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![Primitive::plane(0, DVec3::Z, 2.0, 0.001)];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let center = DVec3::new(1.0, 1.0, 2.0);
        let curve = classified(circle_points(center, 0.5), true, vec![0]);
        let patch = trimmer.trim(&curve).unwrap();
        let TrimmedPatch::Single(face) = patch else {
            panic!("expected a single face");
        };
        let ShapeNode::Disc { radius, center: c, .. } = kernel.node(&face).unwrap() else {
            panic!("expected a disc");
        };
        assert_abs_diff_eq!(radius, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!((c - center).length(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trim_cylinder_parallel_flips_axis() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![
            Primitive::plane(0, DVec3::Z, -2.0, 0.001),
            Primitive::cylinder(1, 1.0, DVec3::ZERO, DVec3::Z, 0.001),
        ];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let curve = classified(circle_points(DVec3::new(0.0, 0.0, -2.0), 1.0), true, vec![1, 0]);
        let TrimmedPatch::Single(shape) = trimmer.trim(&curve).unwrap() else {
            panic!("expected a single shape");
        };
        let ShapeNode::Cylinder {
            height,
            axis,
            radius,
            base,
        } = kernel.node(&shape).unwrap()
        else {
            panic!("expected a cylinder");
        };
        assert_abs_diff_eq!(height, 2.0, epsilon = 1e-12);
        assert_eq!(axis, -DVec3::Z);
        assert_eq!(radius, 1.0);
        assert_eq!(base, DVec3::ZERO);
    }

    #[test]
    fn test_trim_cylinder_oblique_lofts() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![
            Primitive::plane(0, DVec3::new(0.0, 0.6, 0.8), 2.0, 0.001),
            Primitive::cylinder(1, 1.0, DVec3::ZERO, DVec3::Z, 0.001),
        ];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let curve = classified(circle_points(DVec3::new(0.0, 0.0, 2.5), 1.0), true, vec![0, 1]);
        let TrimmedPatch::Single(shape) = trimmer.trim(&curve).unwrap() else {
            panic!("expected a single shape");
        };
        let ShapeNode::Loft { from, to } = kernel.node(&shape).unwrap() else {
            panic!("expected a loft");
        };
        assert!(matches!(from, trim_cad::Wire3D::Circle { normal, .. } if normal.y > 0.5));
        assert!(matches!(to, trim_cad::Wire3D::Circle { center, .. } if center == DVec3::ZERO));

        // Rulings join matching sides of the cut and the base, so the side
        // stays close to the cylinder wall
        let (cut, base) = trim_cad::sample_matched(&from, &to, 64);
        for (a, b) in cut.iter().zip(&base) {
            let radius = ((*a + *b) * 0.5).truncate().length();
            assert!(radius > 0.85 && radius < 1.0 + 1e-9, "mid ruling radius {}", radius);
        }
    }

    #[test]
    fn test_two_planes_give_pair() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![
            Primitive::plane(0, DVec3::Z, 1.0, 0.001),
            Primitive::plane(1, DVec3::Y, 1.0, 0.001),
        ];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let curve = classified(
            vec![DVec3::new(-1.0, 1.0, 1.0), DVec3::new(1.0, 1.0, 1.0)],
            false,
            vec![1, 0],
        );
        let TrimmedPatch::PlanePair([a, b]) = trimmer.trim(&curve).unwrap() else {
            panic!("expected a plane pair");
        };
        assert_eq!((a.primitive, b.primitive), (0, 1));
        assert_eq!(a.normal, DVec3::Z);
        assert_eq!(b.normal, DVec3::Y);
        assert_eq!(a.center, DVec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_three_primitives_parallel_uses_second_cylinder() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![
            Primitive::cylinder(0, 2.0, DVec3::ZERO, DVec3::Z, 0.001),
            Primitive::plane(1, DVec3::Z, 1.0, 0.001),
            Primitive::cylinder(2, 1.0, DVec3::ZERO, -DVec3::Z, 0.001),
        ];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let curve = classified(circle_points(DVec3::new(0.0, 0.0, 1.0), 1.0), true, vec![2, 1, 0]);
        let TrimmedPatch::Single(shape) = trimmer.trim(&curve).unwrap() else {
            panic!("expected a single shape");
        };
        let ShapeNode::Cylinder { radius, axis, .. } = kernel.node(&shape).unwrap() else {
            panic!("expected a cylinder");
        };
        assert_eq!(radius, 1.0);
        assert_eq!(axis, DVec3::Z);
    }

    #[test]
    fn test_three_primitives_non_parallel_unsupported() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![
            Primitive::cylinder(0, 1.0, DVec3::ZERO, DVec3::Z, 0.001),
            Primitive::plane(1, DVec3::Z, 1.0, 0.001),
            Primitive::cylinder(2, 1.0, DVec3::ZERO, DVec3::X, 0.001),
        ];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let curve = classified(circle_points(DVec3::new(0.0, 0.0, 1.0), 1.0), true, vec![0, 1, 2]);
        assert!(matches!(
            trimmer.trim(&curve),
            Err(TrimError::UnsupportedPrimitiveCombination { curve: 0, ref primitives })
                if primitives == &vec![0, 1, 2]
        ));
    }

    #[test]
    fn test_unlisted_combinations_unsupported() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![
            Primitive::cylinder(0, 1.0, DVec3::ZERO, DVec3::Z, 0.001),
            Primitive::cylinder(1, 1.0, DVec3::ZERO, DVec3::Z, 0.001),
        ];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);

        let only_cylinder = classified(circle_points(DVec3::ZERO, 1.0), true, vec![0]);
        assert!(matches!(
            trimmer.trim(&only_cylinder),
            Err(TrimError::UnsupportedPrimitiveCombination { .. })
        ));
        let two_cylinders = classified(circle_points(DVec3::ZERO, 1.0), true, vec![0, 1]);
        assert!(matches!(
            trimmer.trim(&two_cylinders),
            Err(TrimError::UnsupportedPrimitiveCombination { .. })
        ));
        assert_eq!(kernel.shape_count(), 0);
    }

    #[test]
    fn test_unknown_primitive_id() {
        let kernel = CsgKernel::new();
        let config = TrimConfig::default();
        let primitives = vec![Primitive::plane(0, DVec3::Z, 0.0, 0.001)];
        let trimmer = Trimmer::new(&kernel, &primitives, &config);
        let curve = classified(vec![DVec3::ZERO, DVec3::X], false, vec![4]);
        assert!(matches!(
            trimmer.trim(&curve),
            Err(TrimError::UnknownPrimitive { primitive: 4, .. })
        ));
    }
}
