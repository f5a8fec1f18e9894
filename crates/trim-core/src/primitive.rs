//! Analytic surface primitives

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::curve::{Curve, CurveEnds, representative_point};
use crate::error::TrimError;
use trim_cad::math::{distance_to_axis, normalize_or_keep_zero, signed_distance_to_plane};

/// Infinite plane `dot(p, normal) = distance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: DVec3,
    pub distance: f64,
}

impl Plane {
    /// Normal is normalized (zero stays zero)
    pub fn new(normal: DVec3, distance: f64) -> Self {
        Self {
            normal: normalize_or_keep_zero(normal),
            distance,
        }
    }

    /// Point on the plane closest to the origin
    pub fn origin(&self) -> DVec3 {
        self.normal * self.distance
    }

    pub fn signed_distance(&self, point: DVec3) -> f64 {
        signed_distance_to_plane(point, self.normal, self.origin())
    }
}

/// Infinite cylinder around the axis through `base`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub radius: f64,
    pub base: DVec3,
    pub axis: DVec3,
}

impl Cylinder {
    /// Axis is normalized (zero stays zero)
    pub fn new(radius: f64, base: DVec3, axis: DVec3) -> Self {
        Self {
            radius,
            base,
            axis: normalize_or_keep_zero(axis),
        }
    }

    /// Deviation of `point` from the cylinder surface
    pub fn radial_deviation(&self, point: DVec3) -> f64 {
        distance_to_axis(point, self.base, self.axis) - self.radius
    }
}

/// Surface kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane),
    Cylinder(Cylinder),
}

/// Primitive kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Plane,
    Cylinder,
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveKind::Plane => write!(f, "plane"),
            PrimitiveKind::Cylinder => write!(f, "cylinder"),
        }
    }
}

/// A candidate surface with its fit tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Index in the primitive list
    pub id: usize,
    pub surface: Surface,
    /// Containment threshold from the fit, if the fit reported one
    pub tolerance: Option<f64>,
}

impl Primitive {
    pub fn plane(id: usize, normal: DVec3, distance: f64, tolerance: f64) -> Self {
        Self {
            id,
            surface: Surface::Plane(Plane::new(normal, distance)),
            tolerance: Some(tolerance),
        }
    }

    pub fn cylinder(id: usize, radius: f64, base: DVec3, axis: DVec3, tolerance: f64) -> Self {
        Self {
            id,
            surface: Surface::Cylinder(Cylinder::new(radius, base, axis)),
            tolerance: Some(tolerance),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self.surface {
            Surface::Plane(_) => PrimitiveKind::Plane,
            Surface::Cylinder(_) => PrimitiveKind::Cylinder,
        }
    }

    /// Check whether a curve lies on this primitive within `tolerance`
    ///
    /// Planes test the curve's representative point, cylinders its first point.
    pub fn contains_curve(
        &self,
        curve: &Curve,
        ends: CurveEnds,
        tolerance: f64,
    ) -> Result<bool, TrimError> {
        let deviation = match &self.surface {
            Surface::Plane(plane) => plane.signed_distance(representative_point(curve, ends)?),
            Surface::Cylinder(cylinder) => cylinder.radial_deviation(curve.first_point()?),
        };
        Ok(deviation.abs() <= tolerance)
    }
}

/// Find a primitive by id
pub fn lookup(primitives: &[Primitive], curve: usize, id: usize) -> Result<&Primitive, TrimError> {
    primitives
        .get(id)
        .filter(|p| p.id == id)
        .or_else(|| primitives.iter().find(|p| p.id == id))
        .ok_or(TrimError::UnknownPrimitive {
            curve,
            primitive: id,
        })
}
