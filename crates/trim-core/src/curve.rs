//! Boundary curves
//!
//! A curve is a polyline: a list of points plus index-pair segments. Its
//! open/closed shape is derived from segment degrees.

use std::collections::HashMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::TrimError;

/// A polyline boundary curve as read from input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Position in the curve network
    pub index: usize,
    pub points: Vec<DVec3>,
    /// Index pairs into `points`
    pub segments: Vec<[usize; 2]>,
}

impl Curve {
    pub fn new(index: usize, points: Vec<DVec3>, segments: Vec<[usize; 2]>) -> Self {
        Self {
            index,
            points,
            segments,
        }
    }

    /// First point of the polyline
    pub fn first_point(&self) -> Result<DVec3, TrimError> {
        self.points.first().copied().ok_or(TrimError::MalformedCurve {
            curve: self.index,
            endpoints: 0,
        })
    }
}

/// Ordered list of curves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveNetwork {
    pub curves: Vec<Curve>,
}

impl CurveNetwork {
    pub fn new(curves: Vec<Curve>) -> Self {
        Self { curves }
    }

    pub fn get(&self, index: usize) -> Option<&Curve> {
        self.curves.get(index)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

/// Open/closed shape of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveEnds {
    /// Every point has two segments
    Closed,
    /// Point indices of the two endpoints, in order of discovery
    Open([usize; 2]),
}

impl CurveEnds {
    pub fn is_closed(&self) -> bool {
        matches!(self, CurveEnds::Closed)
    }
}

/// Classify a curve as open or closed from its segment degrees
///
/// Only indices referenced by segments are counted. Degree-1 indices are
/// endpoints, listed in the order they are first seen.
pub fn classify_open_closed(curve: &Curve) -> Result<CurveEnds, TrimError> {
    let mut degree: HashMap<usize, usize> = HashMap::new();
    let mut order: Vec<usize> = Vec::new();
    for &[a, b] in &curve.segments {
        for index in [a, b] {
            let count = degree.entry(index).or_insert(0);
            if *count == 0 {
                order.push(index);
            }
            *count += 1;
        }
    }

    let endpoints: Vec<usize> = order
        .into_iter()
        .filter(|index| degree[index] == 1)
        .collect();

    match endpoints.as_slice() {
        [] => Ok(CurveEnds::Closed),
        [start, end] => Ok(CurveEnds::Open([*start, *end])),
        other => Err(TrimError::MalformedCurve {
            curve: curve.index,
            endpoints: other.len(),
        }),
    }
}

/// Point used to test plane containment
///
/// Open curves use the midpoint of their endpoints, closed curves their
/// first point.
pub fn representative_point(curve: &Curve, ends: CurveEnds) -> Result<DVec3, TrimError> {
    match ends {
        CurveEnds::Closed => curve.first_point(),
        CurveEnds::Open([start, end]) => {
            let (a, b) = endpoint_positions(curve, [start, end])?;
            Ok((a + b) * 0.5)
        }
    }
}

/// Positions of two point indices of a curve
pub(crate) fn endpoint_positions(
    curve: &Curve,
    [start, end]: [usize; 2],
) -> Result<(DVec3, DVec3), TrimError> {
    match (curve.points.get(start), curve.points.get(end)) {
        (Some(a), Some(b)) => Ok((*a, *b)),
        _ => Err(TrimError::MalformedCurve {
            curve: curve.index,
            endpoints: 2,
        }),
    }
}

/// Circle through a closed curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedCircle {
    pub center: DVec3,
    pub radius: f64,
}

/// Fit a circle to a curve
///
/// The point farthest from the first point is taken as its diametric
/// opposite. This is not a least-squares fit; it is exact for densely
/// sampled circles whose sampling includes an opposite point.
pub fn fit_circle(curve: &Curve) -> Result<FittedCircle, TrimError> {
    let first = curve.first_point()?;

    let mut opposite = DVec3::ZERO;
    let mut max_distance = f64::MIN_POSITIVE;
    for point in &curve.points {
        let distance = (*point - first).length();
        if distance > max_distance {
            max_distance = distance;
            opposite = *point;
        }
    }

    Ok(FittedCircle {
        center: (first + opposite) * 0.5,
        radius: max_distance * 0.5,
    })
}
